use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tibet_indexer_core::domain::AssetMetadata;
use tibet_indexer_core::traits::AssetMetadataClient;

/// Asset-metadata HTTP client, grounded on the `GET <base>/<asset_id>`
/// contract described in §6: `{name, code, nft_uri}` or `{error: "Not found"}`.
pub struct DexieMetadataClient {
    http_client: Client,
    base_url: String,
}

impl DexieMetadataClient {
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
impl AssetMetadataClient for DexieMetadataClient {
    async fn get_metadata(&self, asset_id: [u8; 32]) -> Result<Option<AssetMetadata>> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            hex::encode(asset_id)
        );

        let response = match self.http_client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("metadata fetch for {} failed: {e}", hex::encode(asset_id));
                return Ok(None);
            }
        };

        let json: serde_json::Value = match response.json().await {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("metadata response for {} unparseable: {e}", hex::encode(asset_id));
                return Ok(None);
            }
        };

        if json.get("error").is_some() {
            return Ok(None);
        }

        let name = json
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("???")
            .to_string();
        let short_name = json
            .get("code")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(&name)
            .to_string();
        let image_url = json
            .get("nft_uri")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(tibet_indexer_core::domain::DEFAULT_IMAGE_URL)
            .to_string();

        Ok(Some(AssetMetadata {
            name,
            short_name,
            image_url,
        }))
    }
}
