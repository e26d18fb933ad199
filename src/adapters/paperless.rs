//! Paperless-ngx client for the thumbnail side channel.
//!
//! Strictly best effort: a missing or unreachable document store must never
//! fail an analysis, so every error here is logged by the caller and
//! swallowed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use tracing::debug;

use crate::domain::models::PaperlessConfig;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Thin REST wrapper around the Paperless-ngx API.
pub struct PaperlessClient {
    api_url: String,
    api_token: String,
    cache_dir: PathBuf,
    client: Client,
}

impl PaperlessClient {
    /// Build a client from configuration, or `None` when no document store
    /// is configured.
    pub fn from_config(config: &PaperlessConfig) -> Option<Self> {
        if config.api_url.is_empty() {
            return None;
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .ok()?;
        Some(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            cache_dir: PathBuf::from(&config.thumbnail_cache_dir),
            client,
        })
    }

    /// Path a cached thumbnail would live at.
    pub fn thumbnail_path(&self, document_id: u64) -> PathBuf {
        self.cache_dir.join(format!("{document_id}.png"))
    }

    /// Fetch the document thumbnail into the cache, skipping the request
    /// when it is already present.
    pub async fn cache_thumbnail(&self, document_id: u64) -> Result<PathBuf> {
        let path = self.thumbnail_path(document_id);
        if path.exists() {
            debug!(document_id, "Thumbnail already cached");
            return Ok(path);
        }

        let bytes = self.fetch_thumbnail(document_id).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("failed to create thumbnail cache directory")?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .context("failed to write cached thumbnail")?;
        debug!(document_id, path = %path.display(), "Thumbnail cached");
        Ok(path)
    }

    async fn fetch_thumbnail(&self, document_id: u64) -> Result<Vec<u8>> {
        let url = format!("{}/documents/{document_id}/thumb/", self.api_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .send()
            .await
            .context("thumbnail request failed")?;

        if !response.status().is_success() {
            bail!("thumbnail request returned HTTP {}", response.status());
        }

        Ok(response.bytes().await.context("failed to read thumbnail body")?.to_vec())
    }

    /// Cache directory, exposed for tests.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}
