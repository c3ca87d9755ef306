use anyhow::{Context as _, Result};
use async_trait::async_trait;
use governor::{clock::DefaultClock, state::direct::NotKeyed, state::InMemoryState, Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tibet_indexer_core::traits::{CoinRecord, FullNodeRpc, PuzzleAndSolution};

/// Full-node RPC client against a `FireAcademy`/Leaflet-style gateway.
///
/// Exposes exactly the three calls the lineage walkers need:
/// `get_coin_record_by_name`, `get_puzzle_and_solution`,
/// `get_block_record_by_height`.
pub struct FireAcademyRpcClient {
    http_client: Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl FireAcademyRpcClient {
    /// Creates a new RPC client rooted at `base_url` (e.g.
    /// `https://kraken.fireacademy.io/<api-key>/leaflet`).
    ///
    /// # Panics
    /// Panics if the rate limiter quota cannot be constructed.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(20).unwrap());
        Self {
            http_client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        self.rate_limiter.until_ready().await;
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let json = response
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("failed to parse response from {url}"))?;
        Ok(json)
    }
}

fn parse_hex32(value: &serde_json::Value, field: &str) -> Result<[u8; 32]> {
    let s = value
        .as_str()
        .with_context(|| format!("field {field} is not a string"))?;
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .with_context(|| format!("field {field} is not valid hex"))?;
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("field {field} is not 32 bytes"))
}

#[async_trait]
impl FullNodeRpc for FireAcademyRpcClient {
    async fn get_coin_record_by_name(&self, coin_id: [u8; 32]) -> Result<Option<CoinRecord>> {
        let body = serde_json::json!({ "name": hex::encode(coin_id) });
        let json = self.post("get_coin_record_by_name", body).await?;

        if json.get("success").and_then(serde_json::Value::as_bool) != Some(true) {
            return Ok(None);
        }
        let Some(record) = json.get("coin_record") else {
            return Ok(None);
        };
        let coin = record
            .get("coin")
            .context("coin_record missing coin field")?;

        Ok(Some(CoinRecord {
            parent_coin_info: parse_hex32(
                coin.get("parent_coin_info").context("missing parent_coin_info")?,
                "parent_coin_info",
            )?,
            puzzle_hash: parse_hex32(
                coin.get("puzzle_hash").context("missing puzzle_hash")?,
                "puzzle_hash",
            )?,
            amount: coin
                .get("amount")
                .and_then(serde_json::Value::as_u64)
                .context("missing amount")?,
            spent: record
                .get("spent")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            spent_block_index: record
                .get("spent_block_index")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0) as u32,
        }))
    }

    async fn get_puzzle_and_solution(
        &self,
        coin_id: [u8; 32],
        height: u32,
    ) -> Result<PuzzleAndSolution> {
        let body = serde_json::json!({
            "coin_id": hex::encode(coin_id),
            "height": height,
        });
        let json = self.post("get_puzzle_and_solution", body).await?;
        let record = json
            .get("coin_solution")
            .context("missing coin_solution")?;

        let puzzle_reveal = record
            .get("puzzle_reveal")
            .and_then(serde_json::Value::as_str)
            .context("missing puzzle_reveal")?;
        let solution = record
            .get("solution")
            .and_then(serde_json::Value::as_str)
            .context("missing solution")?;

        Ok(PuzzleAndSolution {
            puzzle_reveal: hex::decode(puzzle_reveal).context("puzzle_reveal not valid hex")?,
            solution: hex::decode(solution).context("solution not valid hex")?,
        })
    }

    async fn get_block_timestamp(&self, height: u32) -> Result<Option<i64>> {
        let body = serde_json::json!({ "height": height });
        let json = self.post("get_block_record_by_height", body).await?;

        if json.get("success").and_then(serde_json::Value::as_bool) != Some(true) {
            return Ok(None);
        }
        let Some(record) = json.get("block_record") else {
            return Ok(None);
        };
        let timestamp = record.get("timestamp").and_then(serde_json::Value::as_i64);
        Ok(timestamp.filter(|&ts| ts != 0))
    }
}
