use tibet_indexer_clvm::{
    decode_pair_state, eval_new_state, parse_program, run_puzzle, ClvmError, Condition,
};
use tibet_indexer_core::domain::ReserveState;

/// Chia's canonical singleton launcher puzzle hash. A CREATE_COIN condition
/// whose puzzle hash matches this is a launcher deployment, not a normal
/// singleton recreation.
pub const SINGLETON_LAUNCHER_HASH: [u8; 32] = [
    0x7f, 0xaa, 0x32, 0x53, 0xbf, 0xdd, 0xd1, 0xe0, 0xde, 0xcb, 0x09, 0x06, 0xb2, 0xdc, 0x62, 0x47,
    0xbb, 0xc4, 0xcf, 0x60, 0x8f, 0x58, 0x34, 0x5d, 0x17, 0x3a, 0xdb, 0x63, 0xe8, 0xb4, 0x7c, 0x9,
];

/// A decoded spend: the CREATE_COIN conditions it announces, plus — for a
/// pair spend — the reserve state before and after.
#[derive(Debug, Clone)]
pub struct DecodedSpend {
    pub conditions: Vec<Condition>,
    pub pair_state: Option<(ReserveState, ReserveState)>,
}

fn to_domain(triple: tibet_indexer_clvm::ReserveTriple) -> ReserveState {
    ReserveState {
        xch_reserve: triple.xch_reserve,
        token_reserve: triple.token_reserve,
        liquidity: triple.liquidity,
    }
}

/// Decodes a non-pair spend (router or launcher): parses puzzle/solution and
/// runs the puzzle to get its CREATE_COIN conditions.
pub fn decode_spend(puzzle_reveal: &[u8], solution: &[u8]) -> Result<DecodedSpend, ClvmError> {
    let (puzzle, _) = parse_program(puzzle_reveal)?;
    let (solution_value, _) = parse_program(solution)?;
    let conditions = run_puzzle(&puzzle, &solution_value)?;
    Ok(DecodedSpend {
        conditions,
        pair_state: None,
    })
}

/// Decodes a pair spend: in addition to the CREATE_COIN conditions, reads the
/// pre-spend reserve state curried into the inner puzzle and evaluates the
/// solution's embedded new-state sub-puzzle for the post-spend state (§4.A).
///
/// The solution is expected as `(new_state_puzzle params . rest)`, where
/// `rest` (the condition-producing tail) is passed straight to the puzzle
/// alongside the full solution so CREATE_COIN conditions resolve normally.
pub fn decode_pair_spend(puzzle_reveal: &[u8], solution: &[u8]) -> Result<DecodedSpend, ClvmError> {
    let (puzzle, _) = parse_program(puzzle_reveal)?;
    let (solution_value, _) = parse_program(solution)?;

    let conditions = run_puzzle(&puzzle, &solution_value)?;

    let old_state = decode_pair_state(&puzzle)?;

    let parts = solution_value.iter_list()?;
    let new_state_puzzle = parts
        .first()
        .ok_or_else(|| ClvmError::Malformed("pair solution missing new-state puzzle".into()))?;
    let params = parts
        .get(1)
        .ok_or_else(|| ClvmError::Malformed("pair solution missing new-state params".into()))?;

    let new_state = eval_new_state(new_state_puzzle, params, old_state)?;

    Ok(DecodedSpend {
        conditions,
        pair_state: Some((to_domain(old_state), to_domain(new_state))),
    })
}

/// Extracts the CREATE_COIN conditions as `(puzzle_hash, amount)` pairs,
/// erroring per §4.A if any router condition carries an amount outside
/// `{1, 2}`. `is_router` gates whether the amount check applies (pair spends
/// only ever see `amount = 1`, enforced by the caller's lineage-advance
/// logic instead).
pub fn create_coin_conditions(
    conditions: &[Condition],
) -> Vec<([u8; 32], u64)> {
    conditions
        .iter()
        .filter_map(|c| match c {
            Condition::CreateCoin { puzzle_hash, amount } => Some((*puzzle_hash, *amount)),
            Condition::Other { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tibet_indexer_clvm::{curry, serialize, Value};

    fn create_coin_puzzle(puzzle_hash: [u8; 32], amount: u64) -> Value {
        // (q . ((51 puzzle_hash amount))) — quote a single CREATE_COIN condition.
        let condition = Value::list(vec![
            Value::atom(tibet_indexer_clvm::canonical_amount(51)),
            Value::atom(puzzle_hash.to_vec()),
            Value::atom(tibet_indexer_clvm::canonical_amount(amount)),
        ]);
        Value::cons(Value::atom(vec![1]), Value::list(vec![condition]))
    }

    #[test]
    fn decode_spend_extracts_create_coin() {
        let puzzle = create_coin_puzzle([9u8; 32], 1);
        let puzzle_bytes = serialize(&puzzle);
        let solution_bytes = serialize(&Value::nil());

        let decoded = decode_spend(&puzzle_bytes, &solution_bytes).unwrap();
        let coins = create_coin_conditions(&decoded.conditions);
        assert_eq!(coins, vec![([9u8; 32], 1)]);
    }

    #[test]
    fn decode_pair_spend_reports_before_after_state() {
        use tibet_indexer_clvm::decoder::ReserveTriple;

        let old_state = ReserveTriple {
            xch_reserve: 1000,
            token_reserve: 2000,
            liquidity: 1414,
        };
        let new_state = ReserveTriple {
            xch_reserve: 1100,
            token_reserve: 1818,
            liquidity: 1414,
        };

        // Inner puzzle: curried with (mod_placeholder, nil, nil, old_state),
        // body quotes a single CREATE_COIN condition recreating the coin.
        let child_ph = [7u8; 32];
        let puzzle_body = Value::cons(
            Value::atom(vec![1]),
            Value::list(vec![Value::list(vec![
                Value::atom(tibet_indexer_clvm::canonical_amount(51)),
                Value::atom(child_ph.to_vec()),
                Value::atom(tibet_indexer_clvm::canonical_amount(1)),
            ])]),
        );
        let puzzle = curry(
            puzzle_body,
            vec![Value::nil(), Value::nil(), old_state.to_value()],
        );
        let puzzle_bytes = serialize(&puzzle);

        // new-state puzzle: quotes a result list whose first element is the
        // new state, ignoring the (old_state, params, struct, coin_id) env.
        let new_state_puzzle =
            Value::cons(Value::atom(vec![1]), Value::list(vec![new_state.to_value()]));
        let solution = Value::list(vec![new_state_puzzle, Value::nil()]);
        let solution_bytes = serialize(&solution);

        let decoded = decode_pair_spend(&puzzle_bytes, &solution_bytes).unwrap();
        let (before, after) = decoded.pair_state.unwrap();
        assert_eq!(before.xch_reserve, 1000);
        assert_eq!(after.xch_reserve, 1100);
        assert_eq!(after.token_reserve, 1818);

        let coins = create_coin_conditions(&decoded.conditions);
        assert_eq!(coins, vec![(child_ph, 1)]);
    }
}
