use crate::models::{PairRow, RouterRow};
use crate::repositories::{
    HeightRepository, PairRepository, PriceRepository, RouterRepository, TransactionRepository,
};
use crate::schema::CREATE_TABLES;
use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tibet_indexer_core::domain::{HeightToTimestamp, Pair, Router, Transaction};

/// Crash-safe SQLite-backed store. Every write path that needs to land more
/// than one table commits through a single transaction so a crash mid-pass
/// never leaves the tables partially updated (§4.F, §9).
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    pub router: RouterRepository,
    pub pairs: PairRepository,
    pub transactions: TransactionRepository,
    pub heights: HeightRepository,
    pub prices: PriceRepository,
}

impl Store {
    /// Connects to `database_url` (e.g. `sqlite:///./database.db`), creating
    /// the file and schema if they don't exist yet.
    ///
    /// # Errors
    /// Returns an error if the connection or schema migration fails.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connecting to sqlite store")?;
        sqlx::query(CREATE_TABLES)
            .execute(&pool)
            .await
            .context("creating schema")?;
        Ok(Self::from_pool(pool))
    }

    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            router: RouterRepository::new(pool.clone()),
            pairs: PairRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool.clone()),
            heights: HeightRepository::new(pool.clone()),
            prices: PriceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Advances a router's lineage and registers any pairs discovered along
    /// the way, atomically (§4.B). New pairs use `INSERT ... ON CONFLICT DO
    /// NOTHING`, so replaying an already-applied advance is a no-op.
    pub async fn commit_router_advance(&self, router: &Router, new_pairs: &[Pair]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("begin router advance tx")?;

        let router_row = RouterRow::from_domain(router);
        sqlx::query("UPDATE router SET current_coin_id = ?1 WHERE launcher_id = ?2")
            .bind(&router_row.current_coin_id)
            .bind(&router_row.launcher_id)
            .execute(&mut *tx)
            .await
            .context("advancing router")?;

        for pair in new_pairs {
            let row = PairRow::from_domain(pair);
            sqlx::query(
                "INSERT INTO pairs
                    (launcher_id, asset_id, name, short_name, image_url, current_coin_id,
                     xch_reserve, token_reserve, liquidity, trade_volume, trade_volume_usd, last_tx_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(launcher_id) DO NOTHING",
            )
            .bind(&row.launcher_id)
            .bind(&row.asset_id)
            .bind(&row.name)
            .bind(&row.short_name)
            .bind(&row.image_url)
            .bind(&row.current_coin_id)
            .bind(&row.xch_reserve)
            .bind(&row.token_reserve)
            .bind(&row.liquidity)
            .bind(&row.trade_volume)
            .bind(&row.trade_volume_usd)
            .bind(row.last_tx_index)
            .execute(&mut *tx)
            .await
            .context("registering new pair")?;
        }

        tx.commit().await.context("commit router advance tx")?;
        Ok(())
    }

    /// Persists one pair's walked-forward lineage: the updated reserve state,
    /// the new transactions, their block heights, and — where a price bucket
    /// already covers a swap's timestamp — its USD contribution, all in one
    /// transaction (§4.C, §4.E.2).
    pub async fn commit_pair_walk(
        &self,
        pair: &Pair,
        transactions: &[Transaction],
        heights: &[HeightToTimestamp],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("begin pair walk tx")?;

        let pair_row = PairRow::from_domain(pair);
        sqlx::query(
            "UPDATE pairs SET current_coin_id = ?1, xch_reserve = ?2, token_reserve = ?3,
                liquidity = ?4, trade_volume = ?5, last_tx_index = ?6
             WHERE launcher_id = ?7",
        )
        .bind(&pair_row.current_coin_id)
        .bind(&pair_row.xch_reserve)
        .bind(&pair_row.token_reserve)
        .bind(&pair_row.liquidity)
        .bind(&pair_row.trade_volume)
        .bind(pair_row.last_tx_index)
        .bind(&pair_row.launcher_id)
        .execute(&mut *tx)
        .await
        .context("updating pair reserve state")?;

        self.heights.insert_batch(&mut tx, heights).await?;
        let newly_inserted_txns = self.transactions.insert_batch(&mut tx, transactions).await?;
        let newly_inserted: std::collections::HashSet<tibet_indexer_core::domain::Id32> =
            newly_inserted_txns.iter().map(|txn| txn.coin_id).collect();

        let height_ts: std::collections::HashMap<u32, i64> =
            heights.iter().map(|h| (h.height, h.timestamp)).collect();

        let mut usd_delta_by_pair: std::collections::HashMap<tibet_indexer_core::domain::Id32, u128> =
            std::collections::HashMap::new();
        for txn in transactions {
            // Only a transaction this call actually persisted can contribute —
            // replaying an already-committed pass must not double-count it.
            if !newly_inserted.contains(&txn.coin_id) {
                continue;
            }
            if txn.operation != tibet_indexer_core::domain::Operation::Swap {
                continue;
            }
            let Some(timestamp) = height_ts.get(&txn.height).copied() else {
                continue;
            };
            let bucket: Option<(i64,)> = sqlx::query_as(
                "SELECT price_cents FROM average_usd_price
                 WHERE from_timestamp <= ?1 AND to_timestamp > ?1
                 LIMIT 1",
            )
            .bind(timestamp)
            .fetch_optional(&mut *tx)
            .await
            .context("looking up price bucket for swap")?;

            if let Some((price_cents,)) = bucket {
                let usd_cents = txn
                    .state_change
                    .xch
                    .unsigned_abs()
                    .saturating_mul(u128::try_from(price_cents).unwrap_or(0))
                    / 1_000_000_000_000u128;
                *usd_delta_by_pair.entry(txn.pair_launcher_id).or_insert(0) += usd_cents;
            }
        }

        for (pair_launcher_id, delta) in usd_delta_by_pair {
            let current: Option<(String,)> =
                sqlx::query_as("SELECT trade_volume_usd FROM pairs WHERE launcher_id = ?1")
                    .bind(pair_launcher_id.to_hex())
                    .fetch_optional(&mut *tx)
                    .await
                    .context("reading trade_volume_usd for immediate backfill")?;
            if let Some((current_str,)) = current {
                let current_usd: u128 = current_str
                    .parse()
                    .context("trade_volume_usd is not a valid u128")?;
                let updated = (current_usd + delta).to_string();
                sqlx::query("UPDATE pairs SET trade_volume_usd = ?1 WHERE launcher_id = ?2")
                    .bind(&updated)
                    .bind(pair_launcher_id.to_hex())
                    .execute(&mut *tx)
                    .await
                    .context("applying immediate usd backfill")?;
            }
        }

        tx.commit().await.context("commit pair walk tx")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tibet_indexer_core::domain::{
        HeightToTimestamp, Id32, Operation, Pair, ReserveState, Router, RouterVariant, StateChange,
        Transaction,
    };

    fn id(byte: u8) -> Id32 {
        Id32([byte; 32])
    }

    fn sample_router() -> Router {
        Router {
            launcher_id: id(0xAA),
            current_coin_id: id(0xAA),
            variant: RouterVariant::Base,
        }
    }

    async fn store() -> Store {
        Store::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn router_init_is_idempotent() {
        let store = store().await;
        let router = sample_router();
        store.router.init_if_missing(&router).await.unwrap();
        store.router.init_if_missing(&router).await.unwrap();

        let fetched = store.router.get(&router.launcher_id.to_hex()).await.unwrap().unwrap();
        assert_eq!(fetched, router);
    }

    #[tokio::test]
    async fn commit_router_advance_registers_new_pairs_once() {
        let store = store().await;
        let router = sample_router();
        store.router.init_if_missing(&router).await.unwrap();

        let pair = Pair::new_default(id(0x01), id(0x02), id(0x01));
        let advanced = Router {
            current_coin_id: id(0xBB),
            ..router.clone()
        };
        store.commit_router_advance(&advanced, &[pair.clone()]).await.unwrap();
        // Replaying the same advance (e.g. after a crash-restart) must not duplicate the pair.
        store.commit_router_advance(&advanced, &[pair.clone()]).await.unwrap();

        let fetched_router = store.router.get(&router.launcher_id.to_hex()).await.unwrap().unwrap();
        assert_eq!(fetched_router.current_coin_id, id(0xBB));

        let pairs = store.pairs.list().await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].launcher_id, id(0x01));
    }

    #[tokio::test]
    async fn commit_pair_walk_persists_transactions_and_backfills_existing_price() {
        let store = store().await;
        let router = sample_router();
        store.router.init_if_missing(&router).await.unwrap();

        let pair = Pair::new_default(id(0x01), id(0x02), id(0x01));
        store.commit_router_advance(&router, &[pair.clone()]).await.unwrap();

        // A price bucket already covers this swap's timestamp before it lands.
        store
            .prices
            .insert_bucket_and_backfill(tibet_indexer_core::domain::AverageUsdPrice {
                from_timestamp: 1_000_000,
                to_timestamp: 1_003_600,
                price_cents: 2_000,
            })
            .await
            .unwrap();

        let old_state = ReserveState {
            xch_reserve: 1_000_000_000_000,
            token_reserve: 2_000_000_000_000,
            liquidity: 1_414_213_562,
        };
        let new_state = ReserveState {
            xch_reserve: 1_100_000_000_000,
            token_reserve: 1_818_181_818_182,
            liquidity: 1_414_213_562,
        };
        let state_change = StateChange::between(old_state, new_state);
        let txn = Transaction {
            coin_id: id(0x03),
            pair_launcher_id: pair.launcher_id,
            operation: Operation::classify(state_change.liquidity),
            state_change,
            new_state,
            height: 500,
            pair_tx_index: 0,
        };
        let height = HeightToTimestamp { height: 500, timestamp: 1_000_100 };

        let updated_pair = Pair {
            current_coin_id: id(0x04),
            xch_reserve: new_state.xch_reserve,
            token_reserve: new_state.token_reserve,
            liquidity: new_state.liquidity,
            trade_volume: state_change.xch.unsigned_abs(),
            last_tx_index: 0,
            ..pair.clone()
        };

        store
            .commit_pair_walk(&updated_pair, &[txn.clone()], &[height])
            .await
            .unwrap();

        let fetched_pair = store.pairs.get(&pair.launcher_id.to_hex()).await.unwrap().unwrap();
        assert_eq!(fetched_pair.current_coin_id, id(0x04));
        // 0.1 XCH swapped at $20.00/XCH == 200 cents, applied immediately
        // because the price bucket already existed.
        assert_eq!(fetched_pair.trade_volume_usd, 200);

        let transactions = store.transactions.list_for_pair(&pair.launcher_id.to_hex()).await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].coin_id, id(0x03));

        // Replaying the same pass (crash-restart before advancing past this pair)
        // must not double-count the transaction or its USD contribution.
        store
            .commit_pair_walk(&updated_pair, &[txn], &[height])
            .await
            .unwrap();
        let replayed_pair = store.pairs.get(&pair.launcher_id.to_hex()).await.unwrap().unwrap();
        assert_eq!(replayed_pair.trade_volume_usd, 200);
    }
}
