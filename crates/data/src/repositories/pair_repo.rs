use crate::models::PairRow;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tibet_indexer_core::domain::Pair;

/// Typed access to the `pairs` table.
#[derive(Debug, Clone)]
pub struct PairRepository {
    pool: SqlitePool,
}

impl PairRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, launcher_id: &str) -> Result<Option<Pair>> {
        let row = sqlx::query_as::<_, PairRow>(
            "SELECT launcher_id, asset_id, name, short_name, image_url, current_coin_id,
                    xch_reserve, token_reserve, liquidity, trade_volume, trade_volume_usd, last_tx_index
             FROM pairs WHERE launcher_id = ?1",
        )
        .bind(launcher_id)
        .fetch_optional(&self.pool)
        .await
        .context("querying pair")?;

        row.map(PairRow::into_domain).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Pair>> {
        let rows = sqlx::query_as::<_, PairRow>(
            "SELECT launcher_id, asset_id, name, short_name, image_url, current_coin_id,
                    xch_reserve, token_reserve, liquidity, trade_volume, trade_volume_usd, last_tx_index
             FROM pairs ORDER BY launcher_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("listing pairs")?;

        rows.into_iter().map(PairRow::into_domain).collect()
    }
}
