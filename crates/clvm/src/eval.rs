use crate::value::Value;
use crate::ClvmError;

// Opcode atoms, matching chia's CLVM operator numbering. Only the subset a
// curried singleton puzzle and its merkle-dispatched "new state" sub-puzzle
// actually exercise is implemented; anything else raises `Eval`.
const OP_QUOTE: u64 = 1;
const OP_APPLY: u64 = 2;
const OP_IF: u64 = 3;
const OP_CONS: u64 = 4;
const OP_FIRST: u64 = 5;
const OP_REST: u64 = 6;
const OP_LISTP: u64 = 7;
const OP_RAISE: u64 = 8;
const OP_EQ: u64 = 9;
const OP_SHA256: u64 = 11;
const OP_ADD: u64 = 16;
const OP_SUBTRACT: u64 = 17;

/// Evaluates a CLVM program against an environment, following the standard
/// reduction rules: an atom program is an environment path, `(1 . x)` quotes
/// `x` literally, `(2 prog env)` applies `prog` evaluated under the current
/// environment to `env` evaluated under the current environment, and any
/// other leading small-integer atom is a primitive operator applied to its
/// evaluated argument list.
pub fn eval(program: &Value, env: &Value) -> Result<Value, ClvmError> {
    match program {
        Value::Atom(path) => eval_path(path, env),
        Value::Pair(op, args) => {
            let Some(op_bytes) = op.as_atom() else {
                return Err(ClvmError::Eval("operator position holds a pair".into()));
            };
            if op_bytes.is_empty() {
                return Err(ClvmError::Eval("operator atom is nil".into()));
            }
            let opcode = op.as_u64()?;

            if opcode == OP_QUOTE {
                return Ok((**args).clone());
            }
            if opcode == OP_APPLY {
                let prog_expr = args.first()?;
                let env_expr = args.rest()?.first()?;
                let new_prog = eval(prog_expr, env)?;
                let new_env = eval(env_expr, env)?;
                return eval(&new_prog, &new_env);
            }

            let evaluated: Vec<Value> = args
                .iter_list()?
                .into_iter()
                .map(|a| eval(a, env))
                .collect::<Result<_, _>>()?;

            apply_primitive(opcode, &evaluated)
        }
    }
}

/// Resolves an atom used as a program into the environment by CLVM's path
/// convention: 0 selects the whole environment, and each bit of the path
/// (read from the most significant bit down, excluding the leading 1)
/// selects `rest` for 0 and `first` for 1's sibling... in practice we only
/// need path 1 (whole env) and small first/rest walks, so this implements
/// the general rule: path `p` with `p > 1` recurses by halving, taking
/// `first` on even and `rest` on odd.
fn eval_path(path: &[u8], env: &Value) -> Result<Value, ClvmError> {
    if path.is_empty() {
        return Ok(Value::nil());
    }
    let mut n = u128::from_be_bytes({
        let mut buf = [0u8; 16];
        if path.len() > 16 {
            return Err(ClvmError::Eval("environment path atom too wide".into()));
        }
        buf[16 - path.len()..].copy_from_slice(path);
        buf
    });
    if n == 1 {
        return Ok(env.clone());
    }
    if n == 0 {
        return Ok(Value::nil());
    }
    // Walk from the most significant set bit below the leading 1 down to bit 0.
    let mut bits = Vec::new();
    while n > 1 {
        bits.push(n & 1);
        n >>= 1;
    }
    let mut cur = env.clone();
    for bit in bits.into_iter().rev() {
        cur = if bit == 0 { cur.first()?.clone() } else { cur.rest()?.clone() };
    }
    Ok(cur)
}

fn apply_primitive(opcode: u64, args: &[Value]) -> Result<Value, ClvmError> {
    match opcode {
        OP_IF => {
            let cond = args.first().ok_or_else(|| ClvmError::Eval("i: missing cond".into()))?;
            let is_true = !cond.is_nil();
            let branch = if is_true { 1 } else { 2 };
            args.get(branch)
                .cloned()
                .ok_or_else(|| ClvmError::Eval("i: missing branch".into()))
        }
        OP_CONS => {
            if args.len() != 2 {
                return Err(ClvmError::Eval("c: expected 2 args".into()));
            }
            Ok(Value::cons(args[0].clone(), args[1].clone()))
        }
        OP_FIRST => args
            .first()
            .ok_or_else(|| ClvmError::Eval("f: missing arg".into()))?
            .first()
            .cloned(),
        OP_REST => args
            .first()
            .ok_or_else(|| ClvmError::Eval("r: missing arg".into()))?
            .rest()
            .cloned(),
        OP_LISTP => {
            let v = args.first().ok_or_else(|| ClvmError::Eval("l: missing arg".into()))?;
            Ok(bool_value(matches!(v, Value::Pair(..))))
        }
        OP_RAISE => Err(ClvmError::Eval("x: explicit raise".into())),
        OP_EQ => {
            if args.len() != 2 {
                return Err(ClvmError::Eval("=: expected 2 args".into()));
            }
            Ok(bool_value(args[0] == args[1]))
        }
        OP_SHA256 => {
            use sha2::{Digest, Sha256};
            let mut hasher = Sha256::new();
            for a in args {
                let bytes = a
                    .as_atom()
                    .ok_or_else(|| ClvmError::Eval("sha256: argument is a pair".into()))?;
                hasher.update(bytes);
            }
            Ok(Value::atom(hasher.finalize().to_vec()))
        }
        OP_ADD => {
            let mut sum: i128 = 0;
            for a in args {
                sum += a.as_u128()? as i128;
            }
            Ok(Value::atom(crate::value::canonical_amount(sum as u64)))
        }
        OP_SUBTRACT => {
            let mut iter = args.iter();
            let mut acc = iter
                .next()
                .map(|a| a.as_u128())
                .transpose()?
                .unwrap_or(0) as i128;
            for a in iter {
                acc -= a.as_u128()? as i128;
            }
            Ok(Value::atom(crate::value::canonical_amount(acc as u64)))
        }
        other => Err(ClvmError::Eval(format!("unsupported opcode {other}"))),
    }
}

fn bool_value(b: bool) -> Value {
    if b {
        Value::atom(vec![1])
    } else {
        Value::nil()
    }
}

/// One decoded condition emitted by a puzzle's output. Only `CREATE_COIN`
/// (opcode 51) is meaningful to the indexer; every other condition opcode is
/// preserved as `Other` so callers can assert on what's present without the
/// decoder silently dropping data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    CreateCoin { puzzle_hash: [u8; 32], amount: u64 },
    Other { opcode: u64, args: Vec<Vec<u8>> },
}

pub const CREATE_COIN_OPCODE: u64 = 51;

/// Runs `puzzle` against `solution` and returns the resulting condition list.
///
/// The puzzle's output is itself a CLVM cons-list of conditions, each an
/// `(opcode arg1 arg2 ...)` list — the standard chialisp convention.
pub fn run_puzzle(puzzle: &Value, solution: &Value) -> Result<Vec<Condition>, ClvmError> {
    let output = eval(puzzle, solution)?;
    let mut conditions = Vec::new();
    for cond in output.iter_list()? {
        let parts = cond.iter_list()?;
        let opcode_atom = parts
            .first()
            .ok_or_else(|| ClvmError::Malformed("condition with no opcode".into()))?;
        let opcode = opcode_atom.as_u64()?;
        if opcode == CREATE_COIN_OPCODE {
            let ph_atom = parts
                .get(1)
                .ok_or_else(|| ClvmError::Malformed("CREATE_COIN missing puzzle hash".into()))?;
            let amount_atom = parts
                .get(2)
                .ok_or_else(|| ClvmError::Malformed("CREATE_COIN missing amount".into()))?;
            let ph_bytes = ph_atom
                .as_atom()
                .ok_or_else(|| ClvmError::Malformed("CREATE_COIN puzzle hash is a pair".into()))?;
            let puzzle_hash: [u8; 32] = ph_bytes
                .try_into()
                .map_err(|_| ClvmError::Malformed("CREATE_COIN puzzle hash not 32 bytes".into()))?;
            let amount = amount_atom.as_u64()?;
            conditions.push(Condition::CreateCoin { puzzle_hash, amount });
        } else {
            let args = parts[1..]
                .iter()
                .map(|v| v.as_atom().map(<[u8]>::to_vec))
                .collect::<Option<Vec<_>>>()
                .unwrap_or_default();
            conditions.push(Condition::Other { opcode, args });
        }
    }
    Ok(conditions)
}
