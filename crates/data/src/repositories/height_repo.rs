use crate::models::HeightRow;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tibet_indexer_core::domain::HeightToTimestamp;

/// Typed access to the `height_to_timestamp` lookup table.
#[derive(Debug, Clone)]
pub struct HeightRepository {
    pool: SqlitePool,
}

impl HeightRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a batch of heights within a caller-owned transaction, so it can
    /// land atomically alongside the transactions the heights belong to
    /// (`Store::commit_pair_walk`).
    pub async fn insert_batch(
        &self,
        conn: &mut sqlx::SqliteConnection,
        rows: &[HeightToTimestamp],
    ) -> Result<u64> {
        let mut inserted = 0u64;

        for row in rows {
            let r = HeightRow::from_domain(*row);
            let result = sqlx::query(
                "INSERT INTO height_to_timestamp (height, timestamp) VALUES (?1, ?2)
                 ON CONFLICT(height) DO NOTHING",
            )
            .bind(r.height)
            .bind(r.timestamp)
            .execute(&mut *conn)
            .await
            .context("inserting height")?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    pub async fn earliest_timestamp(&self) -> Result<Option<i64>> {
        let row: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT MIN(timestamp) FROM height_to_timestamp")
                .fetch_optional(&self.pool)
                .await
                .context("querying earliest timestamp")?;
        Ok(row.and_then(|(t,)| t))
    }
}
