use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rpc: RpcConfig,
    pub routers: RoutersConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub price: PriceConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub base_url: String,
    pub api_key: String,
    pub network: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutersConfig {
    /// Launcher id of the base (XCH-paired CAT) router.
    pub base_launcher_id: String,
    /// Launcher id of the restricted-CAT router, if this deployment runs one.
    pub rcat_launcher_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub base_url: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dexie.space/v2/cats".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    pub base_url: String,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://min-api.cryptocompare.com/data/v2/histohour".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
    pub price_sync_min_interval_secs: i64,
    pub timestamp_retry_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            error_backoff_secs: 60,
            price_sync_min_interval_secs: 300,
            timestamp_retry_secs: 5,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://./tibet-indexer.db".to_string(),
                max_connections: 10,
            },
            rpc: RpcConfig {
                base_url: "https://kraken.fireacademy.io".to_string(),
                api_key: String::new(),
                network: "mainnet".to_string(),
            },
            routers: RoutersConfig {
                base_launcher_id: String::new(),
                rcat_launcher_id: None,
            },
            metadata: MetadataConfig::default(),
            price: PriceConfig::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}
