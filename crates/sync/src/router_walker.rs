use crate::spend_decoder::{create_coin_conditions, decode_spend, SINGLETON_LAUNCHER_HASH};
use anyhow::{bail, Result};
use tibet_indexer_clvm::{coin_id, parse_program, ClvmError};
use tibet_indexer_core::domain::{Id32, Pair, Router};
use tibet_indexer_core::traits::{AssetMetadataClient, FullNodeRpc};

/// Advances a router's lineage, emitting newly-discovered pair launchers (§4.B).
pub struct RouterWalker<'a> {
    rpc: &'a dyn FullNodeRpc,
    metadata: &'a dyn AssetMetadataClient,
}

impl<'a> RouterWalker<'a> {
    #[must_use]
    pub fn new(rpc: &'a dyn FullNodeRpc, metadata: &'a dyn AssetMetadataClient) -> Self {
        Self { rpc, metadata }
    }

    /// Walks `router` forward to the tip of its known lineage, returning the
    /// updated router and any pairs discovered along the way, in spend order.
    pub async fn walk(&self, router: &Router) -> Result<(Router, Vec<Pair>)> {
        let mut current = router.current_coin_id;
        let mut new_pairs = Vec::new();

        let Some(mut record) = self.rpc.get_coin_record_by_name(current.0).await? else {
            bail!("router coin {current} not found on chain");
        };

        while record.spent {
            let height = record.spent_block_index;
            let puzzle_and_solution = self.rpc.get_puzzle_and_solution(current.0, height).await?;
            let decoded = decode_spend(
                &puzzle_and_solution.puzzle_reveal,
                &puzzle_and_solution.solution,
            )?;

            let tail_hash = if record.puzzle_hash != SINGLETON_LAUNCHER_HASH {
                extract_tail_hash(&puzzle_and_solution.solution).ok()
            } else {
                None
            };

            let spend_coin_name = current;
            let mut advanced = false;

            for (puzzle_hash, amount) in create_coin_conditions(&decoded.conditions) {
                match amount {
                    1 => {
                        let next_id = coin_id(current.0, puzzle_hash, 1);
                        current = Id32(next_id);
                        advanced = true;
                    }
                    2 => {
                        if puzzle_hash != SINGLETON_LAUNCHER_HASH {
                            bail!("pair launcher CREATE_COIN did not target the singleton launcher");
                        }
                        let launcher_id = Id32(coin_id(spend_coin_name.0, puzzle_hash, 2));
                        let asset_id = tail_hash
                            .map(Id32)
                            .ok_or_else(|| anyhow::anyhow!("missing tail hash for pair registration"))?;

                        let metadata = self.metadata.get_metadata(asset_id.0).await.unwrap_or(None);
                        let mut pair = Pair::new_default(launcher_id, asset_id, launcher_id);
                        if let Some(meta) = metadata {
                            pair.name = meta.name;
                            pair.short_name = meta.short_name;
                            pair.image_url = meta.image_url;
                        }
                        new_pairs.push(pair);
                    }
                    other => return Err(ClvmError::UnexpectedAmount(other).into()),
                }
            }

            if !advanced {
                bail!("router spend produced no recreation CREATE_COIN (amount=1)");
            }

            record = self
                .rpc
                .get_coin_record_by_name(current.0)
                .await?
                .ok_or_else(|| anyhow::anyhow!("router child coin {current} not found on chain"))?;
        }

        Ok((
            Router {
                current_coin_id: current,
                ..router.clone()
            },
            new_pairs,
        ))
    }
}

/// Extracts the tail hash a router spend announces: the last element of the
/// last element of the solution program (§4.B.c).
fn extract_tail_hash(solution: &[u8]) -> Result<[u8; 32]> {
    let (value, _) = parse_program(solution)?;
    let top = value.iter_list()?;
    let last = top
        .last()
        .ok_or_else(|| anyhow::anyhow!("router solution is empty"))?;
    let inner = last.iter_list()?;
    let tail = inner
        .last()
        .ok_or_else(|| anyhow::anyhow!("router solution's last element is empty"))?;
    let bytes = tail
        .as_atom()
        .ok_or_else(|| anyhow::anyhow!("tail hash slot holds a pair, not an atom"))?;
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("tail hash is not 32 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tibet_indexer_clvm::{serialize, Value};
    use tibet_indexer_core::domain::{AssetMetadata, RouterVariant};
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

        async fn get_block_timestamp(&self, _height: u32) -> Result<Option<i64>> {
            Ok(Some(1_700_000_000))
        }
    }

    struct NoMetadata;
    #[async_trait]
    impl AssetMetadataClient for NoMetadata {
        async fn get_metadata(&self, _asset_id: [u8; 32]) -> Result<Option<AssetMetadata>> {
            Ok(None)
        }
    }

    fn quote_conditions(conditions: Vec<Value>) -> Value {
        Value::cons(Value::atom(vec![1]), Value::list(conditions))
    }

    fn create_coin(ph: [u8; 32], amount: u64) -> Value {
        Value::list(vec![
            Value::atom(tibet_indexer_clvm::canonical_amount(51)),
            Value::atom(ph.to_vec()),
            Value::atom(tibet_indexer_clvm::canonical_amount(amount)),
        ])
    }

    #[tokio::test]
    async fn s2_router_emits_one_pair() {
        let router_launcher = [0xAAu8; 32];
        let recreate_ph = [0x11u8; 32];
        let asset_id = [0xBBu8; 32];

        let spend_puzzle = quote_conditions(vec![
            create_coin(recreate_ph, 1),
            create_coin(SINGLETON_LAUNCHER_HASH, 2),
        ]);
        let solution = Value::list(vec![Value::nil(), Value::list(vec![Value::atom(asset_id.to_vec())])]);

        let child1 = coin_id(router_launcher, recreate_ph, 1);
        let pair_launcher = coin_id(router_launcher, SINGLETON_LAUNCHER_HASH, 2);

        let mut records = HashMap::new();
        records.insert(
            router_launcher,
            CoinRecord {
                parent_coin_info: [0; 32],
                puzzle_hash: router_launcher, // not the launcher hash constant, a normal router puzzle hash
                amount: 1,
                spent: true,
                spent_block_index: 100,
            },
        );
        records.insert(
            child1,
            CoinRecord {
                parent_coin_info: router_launcher,
                puzzle_hash: recreate_ph,
                amount: 1,
                spent: false,
                spent_block_index: 0,
            },
        );

        let mut spends = HashMap::new();
        spends.insert(router_launcher, (serialize(&spend_puzzle), serialize(&solution)));

        let rpc = FakeRpc { records: Mutex::new(records), spends };
        let metadata = NoMetadata;
        let walker = RouterWalker::new(&rpc, &metadata);

        let router = Router {
            launcher_id: Id32(router_launcher),
            current_coin_id: Id32(router_launcher),
            variant: RouterVariant::Base,
        };

        let (new_router, pairs) = walker.walk(&router).await.unwrap();
        assert_eq!(new_router.current_coin_id, Id32(child1));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].launcher_id, Id32(pair_launcher));
        assert_eq!(pairs[0].asset_id, Id32(asset_id));
        assert_eq!(pairs[0].name, format!("CAT 0x{}", &hex::encode(asset_id)[..8]));
    }

    /// S1: router coin is unspent — no advance, no pairs discovered.
    #[tokio::test]
    async fn s1_empty_bootstrap_leaves_router_unchanged() {
        let router_launcher = [0xAAu8; 32];
        let mut records = HashMap::new();
        records.insert(
            router_launcher,
            CoinRecord {
                parent_coin_info: [0; 32],
                puzzle_hash: router_launcher,
                amount: 1,
                spent: false,
                spent_block_index: 0,
            },
        );

        let rpc = FakeRpc { records: Mutex::new(records), spends: HashMap::new() };
        let metadata = NoMetadata;
        let walker = RouterWalker::new(&rpc, &metadata);

        let router = Router {
            launcher_id: Id32(router_launcher),
            current_coin_id: Id32(router_launcher),
            variant: RouterVariant::Base,
        };

        let (unchanged, pairs) = walker.walk(&router).await.unwrap();
        assert_eq!(unchanged.current_coin_id, Id32(router_launcher));
        assert!(pairs.is_empty());
    }
}
