use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tibet_indexer_core::traits::{PriceEntry, PriceFeedClient};

/// USD price-feed HTTP client against CryptoCompare's historical hourly
/// `histohour` endpoint (`{time, close, volumefrom, volumeto}` per entry).
pub struct CryptoCompareClient {
    http_client: Client,
    base_url: String,
}

impl CryptoCompareClient {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
        }
    }
}

#[async_trait]
impl PriceFeedClient for CryptoCompareClient {
    async fn get_hourly_prices(&self, to_timestamp: i64, limit: u32) -> Result<Vec<PriceEntry>> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("fsym", "XCH".to_string()),
                ("tsym", "USD".to_string()),
                ("limit", limit.to_string()),
                ("toTs", to_timestamp.to_string()),
            ])
            .send()
            .await
            .context("price feed request failed")?;

        let json: serde_json::Value = response
            .json()
            .await
            .context("price feed response not valid JSON")?;

        if json.get("Response").and_then(serde_json::Value::as_str) != Some("Success") {
            let message = json
                .get("Message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error");
            anyhow::bail!("price feed error: {message}");
        }

        let entries = json
            .get("Data")
            .and_then(|d| d.get("Data"))
            .and_then(serde_json::Value::as_array)
            .context("price feed response missing Data.Data array")?;

        entries
            .iter()
            .map(|entry| {
                Ok(PriceEntry {
                    time: entry.get("time").and_then(serde_json::Value::as_i64).context("missing time")?,
                    close: entry.get("close").and_then(serde_json::Value::as_f64).unwrap_or(0.0),
                    volume_from: entry
                        .get("volumefrom")
                        .and_then(serde_json::Value::as_f64)
                        .unwrap_or(0.0),
                    volume_to: entry
                        .get("volumeto")
                        .and_then(serde_json::Value::as_f64)
                        .unwrap_or(0.0),
                })
            })
            .collect()
    }
}
