use clap::{Parser, Subcommand};
use std::sync::Arc;
use tibet_indexer_core::config::AppConfig;
use tibet_indexer_core::ConfigLoader;
use tibet_indexer_data::Store;
use tibet_indexer_orchestrator::{configured_routers, Orchestrator};
use tibet_indexer_rpc::{CryptoCompareClient, DexieMetadataClient, FireAcademyRpcClient};
use tibet_indexer_web_api::ApiServer;

#[derive(Parser)]
#[command(name = "tibet-indexer")]
#[command(about = "TibetSwap AMM analytics indexer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync orchestrator and the read-only web API together
    Serve,
    /// Run a single sync iteration (router walk, pair walks, conditional price sync) and exit
    SyncOnce,
    /// Create the SQLite database file and schema, then exit
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::load()?;

    match cli.command {
        Commands::Serve => run_serve(config).await,
        Commands::SyncOnce => run_sync_once(config).await,
        Commands::InitDb => run_init_db(config).await,
    }
}

async fn run_serve(config: AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(Store::connect(&config.database.url).await?);
    let routers = configured_routers(
        &config.routers.base_launcher_id,
        config.routers.rcat_launcher_id.as_deref(),
    );

    let rpc = FireAcademyRpcClient::new(fire_academy_url(&config));
    let metadata = DexieMetadataClient::new(config.metadata.base_url.clone());
    let price_feed = CryptoCompareClient::new(config.price.base_url.clone());

    let orchestrator_store = store.clone();
    let orchestrator_config = config.orchestrator.clone();
    let sync_handle = tokio::spawn(async move {
        let orchestrator = Orchestrator::new(
            &rpc,
            &metadata,
            &price_feed,
            &orchestrator_store,
            orchestrator_config,
            routers,
        );
        orchestrator.init().await?;
        orchestrator.run().await
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let server = ApiServer::new(store);
    let serve_result = server.serve(&addr).await;

    sync_handle.abort();
    serve_result
}

async fn run_sync_once(config: AppConfig) -> anyhow::Result<()> {
    let store = Store::connect(&config.database.url).await?;
    let routers = configured_routers(
        &config.routers.base_launcher_id,
        config.routers.rcat_launcher_id.as_deref(),
    );

    let rpc = FireAcademyRpcClient::new(fire_academy_url(&config));
    let metadata = DexieMetadataClient::new(config.metadata.base_url.clone());
    let price_feed = CryptoCompareClient::new(config.price.base_url.clone());

    let orchestrator = Orchestrator::new(
        &rpc,
        &metadata,
        &price_feed,
        &store,
        config.orchestrator.clone(),
        routers,
    );
    orchestrator.init().await?;
    orchestrator.run_one_iteration().await
}

/// Composes the full `FireAcademy`/Leaflet gateway URL from the configured
/// base URL and API key (`<base_url>/<api_key>/leaflet`).
fn fire_academy_url(config: &AppConfig) -> String {
    format!("{}/{}/leaflet", config.rpc.base_url, config.rpc.api_key)
}

async fn run_init_db(config: AppConfig) -> anyhow::Result<()> {
    let store = Store::connect(&config.database.url).await?;
    let routers = configured_routers(
        &config.routers.base_launcher_id,
        config.routers.rcat_launcher_id.as_deref(),
    );
    for router in &routers {
        store.router.init_if_missing(router).await?;
    }
    tracing::info!("database initialized at {}", config.database.url);
    Ok(())
}
