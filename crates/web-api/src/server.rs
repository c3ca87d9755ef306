use crate::handlers;
use axum::{routing::get, Router};
use std::sync::Arc;
use tibet_indexer_data::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Read-only REST API over the analytics store (spec.md's out-of-scope query
/// layer, implemented here as the ambient surface a complete service needs).
pub struct ApiServer {
    store: Arc<Store>,
}

impl ApiServer {
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Builds the router with all API routes.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(handlers::root))
            .route("/router", get(handlers::get_router))
            .route("/pairs", get(handlers::get_pairs))
            .route("/transactions", get(handlers::get_transactions))
            .with_state(self.store.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
