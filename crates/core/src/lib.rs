pub mod config;
pub mod config_loader;
pub mod domain;
pub mod traits;

pub use config::{
    AppConfig, DatabaseConfig, MetadataConfig, OrchestratorConfig, PriceConfig, RoutersConfig,
    RpcConfig, ServerConfig,
};
pub use config_loader::ConfigLoader;
pub use domain::{
    AssetMetadata, AverageUsdPrice, HeightToTimestamp, Id32, Operation, Pair, ReserveState,
    Router, RouterVariant, StateChange, Transaction, DEFAULT_IMAGE_URL,
};
pub use traits::{
    AssetMetadataClient, CoinRecord, FullNodeRpc, PriceEntry, PriceFeedClient, PuzzleAndSolution,
};
