use crate::models::TransactionRow;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tibet_indexer_core::domain::Transaction;

/// Typed access to the append-only `transactions` table.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a batch of transactions within a caller-owned transaction.
    /// `coin_id` is the primary key, so a replay of already-recorded
    /// transactions is a no-op (§4.C idempotency); returns the subset that
    /// was actually newly inserted, since only those may contribute to USD
    /// volume backfill.
    pub async fn insert_batch(
        &self,
        conn: &mut sqlx::SqliteConnection,
        transactions: &[Transaction],
    ) -> Result<Vec<Transaction>> {
        let mut newly_inserted = Vec::new();

        for txn in transactions {
            let row = TransactionRow::from_domain(txn);
            let result = sqlx::query(
                "INSERT INTO transactions
                    (coin_id, pair_launcher_id, operation, state_change, new_state, height, pair_tx_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(coin_id) DO NOTHING",
            )
            .bind(&row.coin_id)
            .bind(&row.pair_launcher_id)
            .bind(&row.operation)
            .bind(&row.state_change)
            .bind(&row.new_state)
            .bind(row.height)
            .bind(row.pair_tx_index)
            .execute(&mut *conn)
            .await
            .context("inserting transaction")?;

            if result.rows_affected() > 0 {
                newly_inserted.push(txn.clone());
            }
        }

        Ok(newly_inserted)
    }

    pub async fn list_for_pair(&self, pair_launcher_id: &str) -> Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT coin_id, pair_launcher_id, operation, state_change, new_state, height, pair_tx_index
             FROM transactions WHERE pair_launcher_id = ?1 ORDER BY pair_tx_index",
        )
        .bind(pair_launcher_id)
        .fetch_all(&self.pool)
        .await
        .context("listing transactions for pair")?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }
}
