use crate::asset_store::AssetStore;
use crate::error::{GenerationError, GenerationResult};
use bytes::{Bytes, BytesMut};
use reqwest::StatusCode;
use std::time::Duration;

/// Fetches generated assets and persists them into an [`AssetStore`].
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    max_bytes: u64,
}

impl Downloader {
    pub fn new(timeout: Duration, max_bytes: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, max_bytes })
    }

    fn map_transport(e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(
                "video generation is taking longer than expected".to_string(),
            )
        } else {
            GenerationError::Download(e.to_string())
        }
    }

    /// GETs `locator` and returns the full body. Anything but 200 fails.
    pub async fn fetch(&self, locator: &str) -> GenerationResult<Bytes> {
        let url = reqwest::Url::parse(locator)
            .map_err(|e| GenerationError::Download(format!("invalid locator '{}': {}", locator, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GenerationError::Download(format!(
                "unsupported locator scheme '{}'",
                url.scheme()
            )));
        }

        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Self::map_transport)?;
        if resp.status() != StatusCode::OK {
            return Err(GenerationError::Download(format!(
                "asset host returned {}",
                resp.status()
            )));
        }
        if let Some(len) = resp.content_length() {
            if len > self.max_bytes {
                return Err(GenerationError::Download(format!(
                    "asset is too large ({} bytes > {} bytes limit)",
                    len, self.max_bytes
                )));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = resp.chunk().await.map_err(Self::map_transport)? {
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(GenerationError::Download(format!(
                    "asset exceeded the {} bytes limit",
                    self.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }

    /// Downloads `locator` into `store` under a fresh identifier and returns it.
    pub async fn persist(&self, locator: &str, store: &AssetStore) -> GenerationResult<String> {
        let bytes = self.fetch(locator).await?;
        let identifier = store.allocate();
        store.put(&identifier, &bytes).await?;
        log::info!("Video saved: {} ({} bytes)", identifier, bytes.len());
        Ok(identifier)
    }
}
