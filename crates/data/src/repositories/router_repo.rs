use crate::models::RouterRow;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tibet_indexer_core::domain::Router;

/// Typed access to the single-row-per-variant `router` table.
#[derive(Debug, Clone)]
pub struct RouterRepository {
    pool: SqlitePool,
}

impl RouterRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, launcher_id: &str) -> Result<Option<Router>> {
        let row = sqlx::query_as::<_, RouterRow>(
            "SELECT launcher_id, current_coin_id, variant FROM router WHERE launcher_id = ?1",
        )
        .bind(launcher_id)
        .fetch_optional(&self.pool)
        .await
        .context("querying router")?;

        row.map(RouterRow::into_domain).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Router>> {
        let rows = sqlx::query_as::<_, RouterRow>(
            "SELECT launcher_id, current_coin_id, variant FROM router",
        )
        .fetch_all(&self.pool)
        .await
        .context("listing routers")?;

        rows.into_iter().map(RouterRow::into_domain).collect()
    }

    /// Registers a router's genesis launcher if it isn't already tracked.
    /// Idempotent: a second call with the same launcher id is a no-op.
    pub async fn init_if_missing(&self, router: &Router) -> Result<()> {
        let row = RouterRow::from_domain(router);
        sqlx::query(
            "INSERT INTO router (launcher_id, current_coin_id, variant)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(launcher_id) DO NOTHING",
        )
        .bind(&row.launcher_id)
        .bind(&row.current_coin_id)
        .bind(&row.variant)
        .execute(&self.pool)
        .await
        .context("inserting router")?;
        Ok(())
    }
}
