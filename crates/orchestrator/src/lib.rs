//! Crash-safe sync orchestrator (spec.md §4.F): a single long-running task
//! that repeatedly walks router/pair lineage forward and, periodically,
//! backfills USD pricing.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tibet_indexer_core::config::OrchestratorConfig;
use tibet_indexer_core::domain::{Id32, Router, RouterVariant};
use tibet_indexer_core::traits::{AssetMetadataClient, FullNodeRpc, PriceFeedClient};
use tibet_indexer_data::Store;
use tibet_indexer_sync::{
    PairWalker, RouterWalker, TimestampResolver, UsdPriceSynchronizer, SETTLE_WINDOW_SECS,
};

/// Tracks the two clocks `should_sync_prices` gates on: the wall-clock time
/// of the last sync *attempt* (throttles how often we even try) and the
/// `to_timestamp` of the last bucket actually synced (throttles how far
/// ahead of the feed's settle window we're allowed to run).
#[derive(Debug, Default, Clone, Copy)]
struct PriceSyncState {
    last_attempt_at: Option<i64>,
    last_synced_to: Option<i64>,
}

/// Drives repeated sync iterations against one store until told to stop.
pub struct Orchestrator<'a> {
    rpc: &'a dyn FullNodeRpc,
    metadata: &'a dyn AssetMetadataClient,
    price_feed: &'a dyn PriceFeedClient,
    store: &'a Store,
    config: OrchestratorConfig,
    routers: Vec<Router>,
    should_stop: Arc<AtomicBool>,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub fn new(
        rpc: &'a dyn FullNodeRpc,
        metadata: &'a dyn AssetMetadataClient,
        price_feed: &'a dyn PriceFeedClient,
        store: &'a Store,
        config: OrchestratorConfig,
        routers: Vec<Router>,
    ) -> Self {
        Self {
            rpc,
            metadata,
            price_feed,
            store,
            config,
            routers,
            should_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle the caller can flip to request a graceful stop between
    /// iterations (checked at the top of the loop and during the sleep).
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.should_stop.clone()
    }

    /// Ensures every configured router has a `router` row before the first
    /// iteration runs. Idempotent.
    pub async fn init(&self) -> Result<()> {
        for router in &self.routers {
            self.store.router.init_if_missing(router).await?;
        }
        Ok(())
    }

    /// Runs iterations until `stop_handle()` is flipped. Any error aborts the
    /// current iteration; the orchestrator logs it, waits `error_backoff_secs`
    /// (interruptible), and restarts from the persisted position.
    pub async fn run(&self) -> Result<()> {
        let mut price_sync_state = PriceSyncState::default();

        while !self.should_stop.load(Ordering::SeqCst) {
            match self.run_iteration(&mut price_sync_state).await {
                Ok(()) => {
                    self.interruptible_sleep(Duration::from_secs(self.config.poll_interval_secs))
                        .await;
                }
                Err(err) => {
                    tracing::error!("sync iteration failed: {err:#}");
                    self.interruptible_sleep(Duration::from_secs(self.config.error_backoff_secs))
                        .await;
                }
            }
        }

        Ok(())
    }

    /// Runs exactly one iteration (router walks, pair walks, conditional
    /// price sync) and returns. Used by the `sync-once` CLI command.
    pub async fn run_one_iteration(&self) -> Result<()> {
        let mut price_sync_state = PriceSyncState::default();
        self.run_iteration(&mut price_sync_state).await
    }

    async fn run_iteration(&self, price_sync_state: &mut PriceSyncState) -> Result<()> {
        let timestamps = TimestampResolver::new(
            self.rpc,
            Duration::from_secs(self.config.timestamp_retry_secs),
        );

        for router in &self.routers {
            let current = self
                .store
                .router
                .get(&router.launcher_id.to_hex())
                .await?
                .unwrap_or_else(|| router.clone());

            let walker = RouterWalker::new(self.rpc, self.metadata);
            let (advanced, new_pairs) = walker.walk(&current).await?;
            if advanced.current_coin_id != current.current_coin_id || !new_pairs.is_empty() {
                self.store.commit_router_advance(&advanced, &new_pairs).await?;
            }
        }

        let pair_walker = PairWalker::new(self.rpc, &timestamps);
        for pair in self.store.pairs.list().await? {
            let outcome = pair_walker.walk(&pair).await?;
            if let Some(updated_pair) = outcome.pair {
                self.store
                    .commit_pair_walk(&updated_pair, &outcome.transactions, &outcome.heights)
                    .await?;
            }
        }

        if self.should_sync_prices(price_sync_state) {
            let synchronizer = UsdPriceSynchronizer::new(self.price_feed, self.store);
            let synced_to = synchronizer.sync_prices().await?;
            price_sync_state.last_attempt_at = Some(current_unix_time());
            price_sync_state.last_synced_to = Some(synced_to);
        }

        Ok(())
    }

    /// Price sync runs only if both hold (spec.md §4.F step 3): at least
    /// `price_sync_min_interval_secs` wall-clock seconds have passed since the
    /// last *attempt*, and the settle window on the last synced bucket has
    /// actually elapsed. The first check alone isn't enough — without it,
    /// a sync that turns out to be a no-op (nothing new past the settle
    /// window) would otherwise retry on every poll.
    fn should_sync_prices(&self, state: &PriceSyncState) -> bool {
        let now = current_unix_time();

        if let Some(last_attempt) = state.last_attempt_at {
            if now - last_attempt < self.config.price_sync_min_interval_secs {
                return false;
            }
        }

        match state.last_synced_to {
            Some(last_synced_to) => now >= last_synced_to + SETTLE_WINDOW_SECS,
            None => true,
        }
    }

    async fn interruptible_sleep(&self, duration: Duration) {
        let mut remaining = duration;
        let step = Duration::from_secs(1);
        while remaining > Duration::ZERO {
            if self.should_stop.load(Ordering::SeqCst) {
                return;
            }
            let chunk = step.min(remaining);
            tokio::time::sleep(chunk).await;
            remaining -= chunk;
        }
    }
}

fn current_unix_time() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Builds the `Router` seeds for a deployment's configured launcher ids.
#[must_use]
pub fn configured_routers(base_launcher_id: &str, rcat_launcher_id: Option<&str>) -> Vec<Router> {
    let mut routers = Vec::new();
    if let Some(id) = Id32::from_hex(base_launcher_id) {
        routers.push(Router {
            launcher_id: id,
            current_coin_id: id,
            variant: RouterVariant::Base,
        });
    }
    if let Some(rcat) = rcat_launcher_id {
        if let Some(id) = Id32::from_hex(rcat) {
            routers.push(Router {
                launcher_id: id,
                current_coin_id: id,
                variant: RouterVariant::RestrictedCat,
            });
        }
    }
    routers
}
