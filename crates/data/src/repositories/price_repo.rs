use crate::models::{self, PriceRow, TransactionRow};
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tibet_indexer_core::domain::AverageUsdPrice;

/// Typed access to `average_usd_price` and the swap-volume backfill it drives.
#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: SqlitePool,
}

impl PriceRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The `to_timestamp` of the most recently synced hourly bucket, or `None`
    /// if no buckets have been synced yet.
    pub async fn max_synced_to_timestamp(&self) -> Result<Option<i64>> {
        let row: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT MAX(to_timestamp) FROM average_usd_price")
                .fetch_optional(&self.pool)
                .await
                .context("querying max synced timestamp")?;
        Ok(row.and_then(|(t,)| t))
    }

    pub async fn price_at(&self, timestamp: i64) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT price_cents FROM average_usd_price
             WHERE from_timestamp <= ?1 AND to_timestamp > ?1
             LIMIT 1",
        )
        .bind(timestamp)
        .fetch_optional(&self.pool)
        .await
        .context("querying price bucket")?;
        Ok(row.map(|(c,)| c))
    }

    /// Inserts one hourly price bucket and, if it was genuinely new, backfills
    /// `trade_volume_usd` on every pair with a SWAP in its window (§4.E).
    ///
    /// Returns `false` without touching `pairs` if the bucket already existed
    /// — sync_prices may safely re-run over a range it partly covered before.
    pub async fn insert_bucket_and_backfill(&self, bucket: AverageUsdPrice) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("begin price bucket tx")?;

        let exists: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM average_usd_price WHERE from_timestamp = ?1",
        )
        .bind(bucket.from_timestamp)
        .fetch_optional(&mut *tx)
        .await
        .context("checking existing price bucket")?;

        if exists.is_some() {
            tx.rollback().await.ok();
            return Ok(false);
        }

        let row = PriceRow::from_domain(bucket);
        sqlx::query(
            "INSERT INTO average_usd_price (from_timestamp, to_timestamp, price_cents)
             VALUES (?1, ?2, ?3)",
        )
        .bind(row.from_timestamp)
        .bind(row.to_timestamp)
        .bind(row.price_cents)
        .execute(&mut *tx)
        .await
        .context("inserting price bucket")?;

        let swap_rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT t.coin_id, t.pair_launcher_id, t.operation, t.state_change, t.new_state,
                    t.height, t.pair_tx_index
             FROM transactions t
             JOIN height_to_timestamp h ON h.height = t.height
             WHERE t.operation = 'SWAP' AND h.timestamp >= ?1 AND h.timestamp < ?2",
        )
        .bind(bucket.from_timestamp)
        .bind(bucket.to_timestamp)
        .fetch_all(&mut *tx)
        .await
        .context("querying swaps in bucket window")?;

        let mut xch_by_pair: HashMap<String, u128> = HashMap::new();
        for row in swap_rows {
            let change = models::parse_state_change(&row.state_change)?;
            *xch_by_pair.entry(row.pair_launcher_id).or_insert(0) += change.xch.unsigned_abs();
        }

        for (pair_launcher_id, xch_volume) in xch_by_pair {
            let usd_cents_delta = xch_volume
                .saturating_mul(u128::try_from(bucket.price_cents).unwrap_or(0))
                / 1_000_000_000_000u128;

            let current: Option<(String,)> =
                sqlx::query_as("SELECT trade_volume_usd FROM pairs WHERE launcher_id = ?1")
                    .bind(&pair_launcher_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("reading current trade_volume_usd")?;
            let Some((current_str,)) = current else {
                continue;
            };
            let current_usd: u128 = current_str
                .parse()
                .context("trade_volume_usd is not a valid u128")?;
            let updated = (current_usd + usd_cents_delta).to_string();

            sqlx::query("UPDATE pairs SET trade_volume_usd = ?1 WHERE launcher_id = ?2")
                .bind(&updated)
                .bind(&pair_launcher_id)
                .execute(&mut *tx)
                .await
                .context("backfilling trade_volume_usd")?;
        }

        tx.commit().await.context("commit price bucket tx")?;
        Ok(true)
    }
}
