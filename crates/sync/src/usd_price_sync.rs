use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};
use tibet_indexer_core::domain::AverageUsdPrice;
use tibet_indexer_core::traits::{PriceEntry, PriceFeedClient};
use tibet_indexer_data::Store;

/// API page size cap, kept under the feed's documented limit of 2000 (§4.E).
const BATCH_SIZE: i64 = 2000;
/// The feed needs this much lag before an hour's candle is final.
pub const SETTLE_WINDOW_SECS: i64 = 900;
const HOUR_SECS: i64 = 3600;

/// Backfills hourly average USD/XCH prices and the swap-volume USD totals
/// they unlock (§4.E). Each newly-synced hour commits (bucket insert +
/// per-pair volume update) as one transaction, so a crash mid-sync just
/// resumes from the last committed `to_timestamp`.
pub struct UsdPriceSynchronizer<'a> {
    price_feed: &'a dyn PriceFeedClient,
    store: &'a Store,
}

impl<'a> UsdPriceSynchronizer<'a> {
    #[must_use]
    pub fn new(price_feed: &'a dyn PriceFeedClient, store: &'a Store) -> Self {
        Self { price_feed, store }
    }

    /// Syncs price data up to (current time - 15 minutes), rounded down to
    /// the hour. Returns the `to_timestamp` synced up to.
    pub async fn sync_prices(&self) -> Result<i64> {
        let start_timestamp = match self.store.prices.max_synced_to_timestamp().await? {
            Some(ts) => ts,
            None => match self.store.heights.earliest_timestamp().await? {
                Some(earliest) => (earliest / HOUR_SECS) * HOUR_SECS,
                None => {
                    tracing::info!("no transactions to sync prices for");
                    return Ok(AverageUsdPrice::DEFAULT_SYNC_EPOCH);
                }
            },
        };

        let now = current_unix_time();
        let max_sync_timestamp = ((now - SETTLE_WINDOW_SECS) / HOUR_SECS) * HOUR_SECS;

        if start_timestamp >= max_sync_timestamp {
            tracing::debug!("already synced up to {start_timestamp}, waiting for more data");
            return Ok(start_timestamp);
        }

        let mut current_timestamp = start_timestamp;
        let mut synced_count = 0u32;

        while current_timestamp < max_sync_timestamp {
            let remaining = (max_sync_timestamp - current_timestamp) / HOUR_SECS;
            let limit = BATCH_SIZE.min(remaining);
            let to_ts = current_timestamp + limit * HOUR_SECS;

            let entries = self.price_feed.get_hourly_prices(to_ts, limit as u32).await?;
            if entries.is_empty() {
                tracing::warn!("no price entries returned for batch ending {to_ts}");
                break;
            }

            for entry in &entries {
                if entry.time <= current_timestamp {
                    continue;
                }

                let from_ts = entry.time;
                let to_ts = from_ts + HOUR_SECS;
                let price_cents = average_price_cents(entry);

                let inserted = self
                    .store
                    .prices
                    .insert_bucket_and_backfill(AverageUsdPrice {
                        from_timestamp: from_ts,
                        to_timestamp: to_ts,
                        price_cents,
                    })
                    .await?;

                if inserted {
                    synced_count += 1;
                    tracing::info!("synced price for {from_ts}: ${:.2} USD/XCH", price_cents as f64 / 100.0);
                }
                current_timestamp = to_ts;
            }
        }

        tracing::info!("synced {synced_count} price entries, up to {current_timestamp}");
        Ok(current_timestamp)
    }
}

/// `price_cents = volume_to * 100 // volume_from`, falling back to the close
/// price when either volume is zero (thinly-traded hours).
fn average_price_cents(entry: &PriceEntry) -> i64 {
    if entry.volume_from == 0.0 || entry.volume_to == 0.0 {
        return (entry.close * 100.0) as i64;
    }
    ((entry.volume_to * 100.0) / entry.volume_from) as i64
}

fn current_unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_price_cents_uses_volume_ratio() {
        let entry = PriceEntry {
            time: 0,
            close: 10.0,
            volume_from: 1000.0,
            volume_to: 15000.0,
        };
        assert_eq!(average_price_cents(&entry), 1500);
    }

    #[test]
    fn average_price_cents_falls_back_to_close_when_volume_missing() {
        let entry = PriceEntry {
            time: 0,
            close: 12.34,
            volume_from: 0.0,
            volume_to: 0.0,
        };
        assert_eq!(average_price_cents(&entry), 1234);
    }
}
