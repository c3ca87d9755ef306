use crate::domain::AssetMetadata;
use anyhow::Result;
use async_trait::async_trait;

/// A coin's on-record state as reported by the full node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinRecord {
    pub parent_coin_info: [u8; 32],
    pub puzzle_hash: [u8; 32],
    pub amount: u64,
    pub spent: bool,
    pub spent_block_index: u32,
}

/// A coin's puzzle reveal and solution, as returned for a spent coin.
#[derive(Debug, Clone)]
pub struct PuzzleAndSolution {
    pub puzzle_reveal: Vec<u8>,
    pub solution: Vec<u8>,
}

/// The full-node RPC surface the walkers depend on (§6 of the indexer design).
#[async_trait]
pub trait FullNodeRpc: Send + Sync {
    async fn get_coin_record_by_name(&self, coin_id: [u8; 32]) -> Result<Option<CoinRecord>>;

    async fn get_puzzle_and_solution(
        &self,
        coin_id: [u8; 32],
        height: u32,
    ) -> Result<PuzzleAndSolution>;

    /// Returns `None` if the block record isn't known yet, or its timestamp is unset.
    async fn get_block_timestamp(&self, height: u32) -> Result<Option<i64>>;
}

/// The external asset-metadata HTTP surface.
#[async_trait]
pub trait AssetMetadataClient: Send + Sync {
    async fn get_metadata(&self, asset_id: [u8; 32]) -> Result<Option<AssetMetadata>>;
}

/// One hourly OHLC(V) price entry as returned by the upstream historical feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceEntry {
    pub time: i64,
    pub close: f64,
    pub volume_from: f64,
    pub volume_to: f64,
}

/// The external USD price-feed HTTP surface.
#[async_trait]
pub trait PriceFeedClient: Send + Sync {
    async fn get_hourly_prices(&self, to_timestamp: i64, limit: u32) -> Result<Vec<PriceEntry>>;
}
