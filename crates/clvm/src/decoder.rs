use crate::curry::curry_args;
use crate::eval::eval;
use crate::value::Value;
use crate::ClvmError;

/// A pair's reserve state as curried into (or evaluated out of) its inner
/// puzzle: `(xch_reserve token_reserve liquidity)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveTriple {
    pub xch_reserve: u128,
    pub token_reserve: u128,
    pub liquidity: u128,
}

impl ReserveTriple {
    #[must_use]
    pub fn to_value(self) -> Value {
        Value::list(vec![
            Value::atom(crate::value::canonical_amount(self.xch_reserve as u64)),
            Value::atom(crate::value::canonical_amount(self.token_reserve as u64)),
            Value::atom(crate::value::canonical_amount(self.liquidity as u64)),
        ])
    }

    fn from_value(value: &Value) -> Result<Self, ClvmError> {
        let parts = value.iter_list()?;
        if parts.len() != 3 {
            return Err(ClvmError::Malformed(format!(
                "reserve state triple has {} elements, expected 3",
                parts.len()
            )));
        }
        Ok(Self {
            xch_reserve: parts[0].as_u128()?,
            token_reserve: parts[1].as_u128()?,
            liquidity: parts[2].as_u128()?,
        })
    }
}

/// Reads the old reserve state from a pair's inner puzzle: the third curried
/// parameter of the inner-layer singleton puzzle, per §4.A.
pub fn decode_pair_state(inner_puzzle: &Value) -> Result<ReserveTriple, ClvmError> {
    let args = curry_args(inner_puzzle)?;
    let state = args
        .get(2)
        .ok_or_else(|| ClvmError::Malformed("inner puzzle has fewer than 3 curried args".into()))?;
    ReserveTriple::from_value(state)
}

/// Evaluates the "new-state" sub-puzzle embedded in a pair spend's solution.
///
/// The merkle-dispatch wrapper's inner branch supplies both the sub-puzzle to
/// run and the parameters to pass. The decoder invokes it with
/// `(old_state, params, dummy_singleton_struct, dummy_coin_id)` and takes the
/// first element of the result.
pub fn eval_new_state(
    new_state_puzzle: &Value,
    params: &Value,
    old_state: ReserveTriple,
) -> Result<ReserveTriple, ClvmError> {
    let dummy_singleton_struct = Value::nil();
    let dummy_coin_id = Value::atom(vec![0u8; 32]);
    let env = Value::list(vec![
        old_state.to_value(),
        params.clone(),
        dummy_singleton_struct,
        dummy_coin_id,
    ]);
    let result = eval(new_state_puzzle, &env)?;
    let new_state = result.first()?;
    ReserveTriple::from_value(new_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curry::curry;

    #[test]
    fn decode_pair_state_roundtrips_curried_triple() {
        let mod_program = Value::atom(vec![1]); // placeholder mod body, unused by curry_args
        let state = ReserveTriple {
            xch_reserve: 1000,
            token_reserve: 2000,
            liquidity: 1414,
        };
        let puzzle = curry(
            mod_program,
            vec![Value::nil(), Value::nil(), state.to_value()],
        );
        let decoded = decode_pair_state(&puzzle).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn eval_new_state_reads_first_of_result() {
        // new-state puzzle: quote a fixed result list whose first element is
        // the new triple, ignoring its environment entirely.
        let new_state = ReserveTriple {
            xch_reserve: 1100,
            token_reserve: 1818,
            liquidity: 1414,
        };
        let result_list = Value::list(vec![new_state.to_value(), Value::nil()]);
        let puzzle = Value::cons(Value::atom(vec![1]), result_list); // (q . result_list)

        let old_state = ReserveTriple {
            xch_reserve: 1000,
            token_reserve: 2000,
            liquidity: 1414,
        };
        let decoded = eval_new_state(&puzzle, &Value::nil(), old_state).unwrap();
        assert_eq!(decoded, new_state);
    }
}
