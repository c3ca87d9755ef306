use anyhow::Result;
use std::time::Duration;
use tibet_indexer_core::traits::FullNodeRpc;

/// Maps block height to wall-clock timestamp, retrying with a bounded sleep
/// when the RPC hasn't recorded the block yet (§4.D). Never writes; callers
/// persist the result.
pub struct TimestampResolver<'a> {
    rpc: &'a dyn FullNodeRpc,
    retry_interval: Duration,
}

impl<'a> TimestampResolver<'a> {
    #[must_use]
    pub fn new(rpc: &'a dyn FullNodeRpc, retry_interval: Duration) -> Self {
        Self { rpc, retry_interval }
    }

    pub async fn resolve(&self, height: u32) -> Result<i64> {
        loop {
            if let Some(ts) = self.rpc.get_block_timestamp(height).await? {
                return Ok(ts);
            }
            tracing::warn!("no timestamp yet for height {height}, retrying in {:?}", self.retry_interval);
            tokio::time::sleep(self.retry_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tibet_indexer_core::traits::{CoinRecord, PuzzleAndSolution};

    struct FlakyRpc {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl FullNodeRpc for FlakyRpc {
        async fn get_coin_record_by_name(&self, _coin_id: [u8; 32]) -> Result<Option<CoinRecord>> {
            unimplemented!()
        }
        async fn get_puzzle_and_solution(&self, _coin_id: [u8; 32], _height: u32) -> Result<PuzzleAndSolution> {
            unimplemented!()
        }
        async fn get_block_timestamp(&self, _height: u32) -> Result<Option<i64>> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Ok(None)
            } else {
                Ok(Some(42))
            }
        }
    }

    #[tokio::test]
    async fn resolve_retries_until_timestamp_present() {
        let rpc = FlakyRpc { attempts: AtomicU32::new(0) };
        let resolver = TimestampResolver::new(&rpc, Duration::from_millis(1));
        let ts = resolver.resolve(100).await.unwrap();
        assert_eq!(ts, 42);
    }
}
