use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::AuditorError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditorConfig {
    /// Base URL of the log personality serving `/latest-root`
    #[serde(default = "default_log_url")]
    pub log_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Persist the trusted root here between restarts
    #[serde(default)]
    pub snapshot_path: Option<String>,
    /// Serve the trusted root read-only on this address
    #[serde(default)]
    pub status_addr: Option<String>,
    #[serde(default = "default_malformed_escalation_threshold")]
    pub malformed_escalation_threshold: u32,
}

fn default_log_url() -> String {
    "http://localhost:50053".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    1
}

fn default_fetch_timeout_secs() -> u64 {
    2
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_malformed_escalation_threshold() -> u32 {
    3
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            log_url: default_log_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            snapshot_path: None,
            status_addr: None,
            malformed_escalation_threshold: default_malformed_escalation_threshold(),
        }
    }
}

impl AuditorConfig {
    /// Load from an optional TOML file, then `AUDITOR_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, AuditorError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            info!("Loading auditor configuration from: {:?}", path);
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let config: AuditorConfig = builder
            .add_source(::config::Environment::with_prefix("AUDITOR").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AuditorError> {
        if self.log_url.trim().is_empty() {
            return Err(AuditorError::ConfigError("log_url cannot be empty".to_string()));
        }

        if self.poll_interval_secs == 0 {
            return Err(AuditorError::ConfigError(
                "poll_interval_secs must be positive".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(AuditorError::ConfigError(
                "connect_timeout_secs must be positive".to_string(),
            ));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(AuditorError::ConfigError(
                "fetch_timeout_secs must be positive".to_string(),
            ));
        }

        if self.malformed_escalation_threshold == 0 {
            return Err(AuditorError::ConfigError(
                "malformed_escalation_threshold must be at least 1".to_string(),
            ));
        }

        if let Some(addr) = &self.status_addr {
            addr.parse::<SocketAddr>().map_err(|e| {
                AuditorError::ConfigError(format!("Invalid status_addr {}: {}", addr, e))
            })?;
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
