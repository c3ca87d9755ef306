use crate::value::Value;
use crate::ClvmError;

const OP_QUOTE: u64 = 1;
const OP_APPLY: u64 = 2;
const OP_CONS: u64 = 4;

/// Extracts the curried parameter list from a program built by the standard
/// chialisp curry construction:
///
/// ```text
/// (a (q . MOD) (c (q . a0) (c (q . a1) (c (q . a2) 1))))
/// ```
///
/// returning `[a0, a1, a2, ...]` in curry order. Errors if `program` isn't
/// shaped this way.
pub fn curry_args(program: &Value) -> Result<Vec<Value>, ClvmError> {
    let op = program.first()?;
    if op.as_u64()? != OP_APPLY {
        return Err(ClvmError::Malformed("not a curried program (missing apply)".into()));
    }
    let apply_args = program.rest()?;
    let mod_expr = apply_args.first()?;
    if mod_expr.first()?.as_u64()? != OP_QUOTE {
        return Err(ClvmError::Malformed("curried mod is not quoted".into()));
    }

    let mut rest_chain = apply_args.rest()?.first()?.clone();
    let mut out = Vec::new();
    loop {
        if rest_chain.as_atom().is_some() {
            break;
        }
        let op = rest_chain.first()?;
        if op.as_u64()? != OP_CONS {
            return Err(ClvmError::Malformed("curry chain broken (missing cons)".into()));
        }
        let cons_args = rest_chain.rest()?;
        let quoted_arg = cons_args.first()?;
        if quoted_arg.first()?.as_u64()? != OP_QUOTE {
            return Err(ClvmError::Malformed("curried arg is not quoted".into()));
        }
        out.push(quoted_arg.rest()?.clone());
        rest_chain = cons_args.rest()?.first()?.clone();
    }
    Ok(out)
}

/// Builds the curry wrapper `(a (q . mod) (c (q . a0) ... 1))` around `mod_program`.
#[must_use]
pub fn curry(mod_program: Value, args: Vec<Value>) -> Value {
    let mut chain = Value::atom(vec![1]); // terminal: path 1, the solution env
    for arg in args.into_iter().rev() {
        chain = Value::list(vec![
            Value::atom(vec![OP_CONS as u8]),
            Value::cons(Value::atom(vec![OP_QUOTE as u8]), arg),
            chain,
        ]);
    }
    Value::list(vec![
        Value::atom(vec![OP_APPLY as u8]),
        Value::cons(Value::atom(vec![OP_QUOTE as u8]), mod_program),
        chain,
    ])
}
