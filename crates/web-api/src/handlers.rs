use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tibet_indexer_core::domain::{Pair, Router, Transaction};
use tibet_indexer_data::Store;

#[derive(Deserialize)]
pub struct TransactionsQuery {
    pair_launcher_id: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    42
}

pub async fn root() -> &'static str {
    "TibetSwap Analytics API is running"
}

/// Returns the base router's lineage position, or 404 if it isn't tracked yet.
///
/// # Errors
/// Returns `StatusCode::NOT_FOUND` if no router row exists, or
/// `StatusCode::INTERNAL_SERVER_ERROR` if the store query fails.
pub async fn get_router(State(store): State<Arc<Store>>) -> Result<Json<Router>, StatusCode> {
    let routers = store.router.list().await.map_err(|err| {
        tracing::error!("listing routers failed: {err:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    routers.into_iter().next().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Lists every tracked pair and its current reserve/volume state.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if the store query fails.
pub async fn get_pairs(State(store): State<Arc<Store>>) -> Result<Json<Vec<Pair>>, StatusCode> {
    store.pairs.list().await.map(Json).map_err(|err| {
        tracing::error!("listing pairs failed: {err:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Lists a pair's transactions, most recent first, capped at `limit` (default 42).
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if the store query fails.
pub async fn get_transactions(
    State(store): State<Arc<Store>>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, StatusCode> {
    let mut transactions = store
        .transactions
        .list_for_pair(&query.pair_launcher_id)
        .await
        .map_err(|err| {
            tracing::error!("listing transactions failed: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    transactions.sort_by_key(|t| std::cmp::Reverse(t.height));
    transactions.truncate(query.limit);
    Ok(Json(transactions))
}
