use crate::spend_decoder::{create_coin_conditions, decode_pair_spend, decode_spend, SINGLETON_LAUNCHER_HASH};
use crate::timestamp_resolver::TimestampResolver;
use anyhow::{bail, Result};
use tibet_indexer_clvm::coin_id;
use tibet_indexer_core::domain::{HeightToTimestamp, Id32, Operation, Pair, StateChange, Transaction};
use tibet_indexer_core::traits::FullNodeRpc;

/// Result of walking one pair's lineage forward to its current tip (§4.C).
#[derive(Debug, Default)]
pub struct PairWalkOutcome {
    pub pair: Option<Pair>,
    pub transactions: Vec<Transaction>,
    pub heights: Vec<HeightToTimestamp>,
}

pub struct PairWalker<'a> {
    rpc: &'a dyn FullNodeRpc,
    timestamps: &'a TimestampResolver<'a>,
}

impl<'a> PairWalker<'a> {
    #[must_use]
    pub fn new(rpc: &'a dyn FullNodeRpc, timestamps: &'a TimestampResolver<'a>) -> Self {
        Self { rpc, timestamps }
    }

    pub async fn walk(&self, pair: &Pair) -> Result<PairWalkOutcome> {
        let mut current = pair.current_coin_id;

        let Some(mut record) = self.rpc.get_coin_record_by_name(current.0).await? else {
            bail!("pair coin {current} not found on chain");
        };

        // The launcher coin itself is never a pair-shaped spend: its single
        // CREATE_COIN condition just hands off to the pair's first real coin.
        if record.puzzle_hash == SINGLETON_LAUNCHER_HASH {
            if !record.spent {
                return Ok(PairWalkOutcome::default());
            }
            let height = record.spent_block_index;
            let ps = self.rpc.get_puzzle_and_solution(current.0, height).await?;
            let decoded = decode_spend(&ps.puzzle_reveal, &ps.solution)?;
            let (child_ph, _amount) = create_coin_conditions(&decoded.conditions)
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("pair launcher spend produced no CREATE_COIN"))?;
            let next = Id32(coin_id(current.0, child_ph, 1));
            current = next;
            record = self
                .rpc
                .get_coin_record_by_name(current.0)
                .await?
                .ok_or_else(|| anyhow::anyhow!("pair coin {current} not found on chain"))?;
        }

        if !record.spent {
            return Ok(PairWalkOutcome::default());
        }

        let mut last_tx_index = pair.last_tx_index;
        let mut trade_volume = pair.trade_volume;
        let mut transactions = Vec::new();
        let mut heights = Vec::new();
        let mut last_state = None;

        while record.spent {
            let height = record.spent_block_index;
            let ps = self.rpc.get_puzzle_and_solution(current.0, height).await?;
            let decoded = decode_pair_spend(&ps.puzzle_reveal, &ps.solution)?;
            let (old_state, new_state) = decoded
                .pair_state
                .ok_or_else(|| anyhow::anyhow!("pair spend decoded with no reserve state"))?;

            let state_change = StateChange::between(old_state, new_state);
            let operation = Operation::classify(state_change.liquidity);

            last_tx_index += 1;
            let tx = Transaction {
                coin_id: current,
                pair_launcher_id: pair.launcher_id,
                operation,
                state_change,
                new_state,
                height,
                pair_tx_index: last_tx_index,
            };

            if operation == Operation::Swap {
                trade_volume += state_change.xch.unsigned_abs();
            }

            let timestamp = self.timestamps.resolve(height).await?;
            heights.push(HeightToTimestamp { height, timestamp });
            transactions.push(tx);
            last_state = Some(new_state);

            let (child_ph, _amount) = create_coin_conditions(&decoded.conditions)
                .into_iter()
                .find(|(_, amount)| *amount == 1)
                .ok_or_else(|| anyhow::anyhow!("pair spend produced no recreation CREATE_COIN"))?;
            current = Id32(coin_id(current.0, child_ph, 1));

            record = self
                .rpc
                .get_coin_record_by_name(current.0)
                .await?
                .ok_or_else(|| anyhow::anyhow!("pair coin {current} not found on chain"))?;
        }

        let final_state = last_state.unwrap();
        let updated_pair = Pair {
            current_coin_id: current,
            xch_reserve: final_state.xch_reserve,
            token_reserve: final_state.token_reserve,
            liquidity: final_state.liquidity,
            trade_volume,
            last_tx_index,
            ..pair.clone()
        };

        Ok(PairWalkOutcome {
            pair: Some(updated_pair),
            transactions,
            heights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp_resolver::TimestampResolver;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tibet_indexer_clvm::{coin_id, curry, serialize, ReserveTriple, Value};
    use tibet_indexer_core::domain::Id32;
    use tibet_indexer_core::traits::{CoinRecord, PuzzleAndSolution};

    struct FakeRpc {
        records: Mutex<HashMap<[u8; 32], CoinRecord>>,
        spends: HashMap<[u8; 32], (Vec<u8>, Vec<u8>)>,
    }

    #[async_trait]
    impl FullNodeRpc for FakeRpc {
        async fn get_coin_record_by_name(&self, coin_id: [u8; 32]) -> Result<Option<CoinRecord>> {
            Ok(self.records.lock().unwrap().get(&coin_id).copied())
        }

        async fn get_puzzle_and_solution(
            &self,
            coin_id: [u8; 32],
            _height: u32,
        ) -> Result<PuzzleAndSolution> {
            let (puzzle_reveal, solution) = self.spends.get(&coin_id).cloned().unwrap();
            Ok(PuzzleAndSolution { puzzle_reveal, solution })
        }

        async fn get_block_timestamp(&self, height: u32) -> Result<Option<i64>> {
            Ok(Some(1_700_000_000 + i64::from(height)))
        }
    }

    fn pair_puzzle(recreate_ph: [u8; 32], state: ReserveTriple) -> Value {
        let body = Value::cons(
            Value::atom(vec![1]),
            Value::list(vec![Value::list(vec![
                Value::atom(tibet_indexer_clvm::canonical_amount(51)),
                Value::atom(recreate_ph.to_vec()),
                Value::atom(tibet_indexer_clvm::canonical_amount(1)),
            ])]),
        );
        curry(body, vec![Value::nil(), Value::nil(), state.to_value()])
    }

    fn new_state_solution(new_state: ReserveTriple) -> Value {
        let new_state_puzzle =
            Value::cons(Value::atom(vec![1]), Value::list(vec![new_state.to_value()]));
        Value::list(vec![new_state_puzzle, Value::nil()])
    }

    /// S3 (first swap) followed by S4 (add liquidity), driven through a real
    /// `PairWalker::walk` from the pair's launcher coin.
    #[tokio::test]
    async fn walks_launcher_then_swap_then_add_liquidity() {
        let launcher = [0x01u8; 32];
        let child_ph_1 = [0x11u8; 32];
        let child_ph_2 = [0x22u8; 32];
        let child_ph_3 = [0x33u8; 32];

        let child1 = coin_id(launcher, child_ph_1, 1);
        let child2 = coin_id(child1, child_ph_2, 1);
        let child3 = coin_id(child2, child_ph_3, 1);

        let launcher_spend_puzzle = Value::cons(
            Value::atom(vec![1]),
            Value::list(vec![Value::list(vec![
                Value::atom(tibet_indexer_clvm::canonical_amount(51)),
                Value::atom(child_ph_1.to_vec()),
                Value::atom(tibet_indexer_clvm::canonical_amount(1)),
            ])]),
        );

        let s3_old = ReserveTriple { xch_reserve: 1000, token_reserve: 2000, liquidity: 1414 };
        let s3_new = ReserveTriple { xch_reserve: 1100, token_reserve: 1818, liquidity: 1414 };
        let s4_new = ReserveTriple { xch_reserve: 1210, token_reserve: 2000, liquidity: 1550 };

        let child1_puzzle = pair_puzzle(child_ph_2, s3_old);
        let child1_solution = new_state_solution(s3_new);
        let child2_puzzle = pair_puzzle(child_ph_3, s3_new);
        let child2_solution = new_state_solution(s4_new);

        let mut records = HashMap::new();
        records.insert(
            launcher,
            CoinRecord {
                parent_coin_info: [0; 32],
                puzzle_hash: SINGLETON_LAUNCHER_HASH,
                amount: 1,
                spent: true,
                spent_block_index: 100,
            },
        );
        records.insert(
            child1,
            CoinRecord {
                parent_coin_info: launcher,
                puzzle_hash: child_ph_1,
                amount: 1,
                spent: true,
                spent_block_index: 101,
            },
        );
        records.insert(
            child2,
            CoinRecord {
                parent_coin_info: child1,
                puzzle_hash: child_ph_2,
                amount: 1,
                spent: true,
                spent_block_index: 102,
            },
        );
        records.insert(
            child3,
            CoinRecord {
                parent_coin_info: child2,
                puzzle_hash: child_ph_3,
                amount: 1,
                spent: false,
                spent_block_index: 0,
            },
        );

        let mut spends = HashMap::new();
        spends.insert(launcher, (serialize(&launcher_spend_puzzle), serialize(&Value::nil())));
        spends.insert(child1, (serialize(&child1_puzzle), serialize(&child1_solution)));
        spends.insert(child2, (serialize(&child2_puzzle), serialize(&child2_solution)));

        let rpc = FakeRpc { records: Mutex::new(records), spends };
        let timestamps = TimestampResolver::new(&rpc, Duration::from_millis(1));
        let walker = PairWalker::new(&rpc, &timestamps);

        let pair = Pair::new_default(Id32(launcher), Id32([0xBBu8; 32]), Id32(launcher));
        let outcome = walker.walk(&pair).await.unwrap();

        let updated = outcome.pair.expect("pair advanced");
        assert_eq!(updated.current_coin_id, Id32(child3));
        assert_eq!(updated.xch_reserve, 1210);
        assert_eq!(updated.token_reserve, 2000);
        assert_eq!(updated.liquidity, 1550);
        // Only the SWAP's |Δxch| = 100 counts toward trade_volume; the
        // ADD_LIQUIDITY's Δxch = 110 must not.
        assert_eq!(updated.trade_volume, 100);
        assert_eq!(updated.last_tx_index, 1);

        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.transactions[0].operation, Operation::Swap);
        assert_eq!(outcome.transactions[0].pair_tx_index, 0);
        assert_eq!(outcome.transactions[1].operation, Operation::AddLiquidity);
        assert_eq!(outcome.transactions[1].pair_tx_index, 1);
        assert_eq!(outcome.heights.len(), 2);
    }

    /// S1-equivalent at the pair level: an unspent current coin yields no
    /// transactions and no pair update.
    #[tokio::test]
    async fn unspent_pair_coin_yields_no_outcome() {
        let coin = [0x01u8; 32];
        let mut records = HashMap::new();
        records.insert(
            coin,
            CoinRecord {
                parent_coin_info: [0; 32],
                puzzle_hash: [0x99u8; 32],
                amount: 1,
                spent: false,
                spent_block_index: 0,
            },
        );
        let rpc = FakeRpc { records: Mutex::new(records), spends: HashMap::new() };
        let timestamps = TimestampResolver::new(&rpc, Duration::from_millis(1));
        let walker = PairWalker::new(&rpc, &timestamps);

        let pair = Pair::new_default(Id32(coin), Id32([0xBBu8; 32]), Id32(coin));
        let outcome = walker.walk(&pair).await.unwrap();
        assert!(outcome.pair.is_none());
        assert!(outcome.transactions.is_empty());
    }
}
