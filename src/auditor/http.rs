//! HTTP Log Source
//!
//! Fetches the latest root and consistency proof from a log personality
//! exposing `GET /latest-root?last_tree_size=N` with a JSON body.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::auditor::source::{LatestRoot, LogSource};
use crate::error::FetchError;

/// Log source speaking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpLogSource {
    base_url: String,
    http_client: Client,
}

impl HttpLogSource {
    /// Create a source for the log at `base_url`
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Auditing log at {}", base_url);

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch_latest(&self, known_tree_size: u64) -> Result<LatestRoot, FetchError> {
        let url = format!("{}/latest-root", self.base_url);
        debug!("GET {} last_tree_size={}", url, known_tree_size);

        let response = self
            .http_client
            .get(&url)
            .query(&[("last_tree_size", known_tree_size)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let latest: LatestRoot = serde_json::from_slice(&body)
            .map_err(|e| FetchError::Protocol(format!("Invalid latest root response: {}", e)))?;

        debug!(
            "Log reported size={} revision={} with {} proof hashes",
            latest.root.tree_size,
            latest.root.revision,
            latest.proof.len()
        );
        Ok(latest)
    }
}
