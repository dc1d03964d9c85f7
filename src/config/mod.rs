//! Heartbeat configuration.
//!
//! Every field has a default matching the production collection service, so
//! an embedding host can use `HeartbeatConfig::default()` as-is or deserialize
//! a partial object from its own settings.

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{BeaconError, Result};

/// Production collection endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://mblcp-player-tracker-still-snow-8423.fly.dev/heartbeat";
/// Modpack name reported in every payload.
pub const DEFAULT_MODPACK: &str = "MBLCP";
/// Tick period in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 30_000;
/// Storage key the installation identity lives under.
pub const DEFAULT_IDENTITY_KEY: &str = "MBLCP_PlayerId";
/// Per-request timeout. Kept below the interval so a hung request frees the
/// guard before too many ticks are dropped.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

const DEFAULT_USER_AGENT: &str = concat!("presence-beacon/", env!("CARGO_PKG_VERSION"));

/// Heartbeat client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Full URL the heartbeat is POSTed to.
    pub endpoint: String,
    /// Value of the `modpack` field in the JSON body.
    pub modpack: String,
    /// Tick period in milliseconds.
    pub interval_ms: u64,
    /// Timeout applied to each heartbeat request.
    pub request_timeout_secs: u64,
    /// Key used to read/write the installation identity.
    pub identity_key: String,
    /// User-Agent header sent with each request.
    pub user_agent: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            modpack: DEFAULT_MODPACK.to_string(),
            interval_ms: DEFAULT_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            identity_key: DEFAULT_IDENTITY_KEY.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HeartbeatConfig {
    /// Tick period as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check that the config can drive a scheduler.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(BeaconError::Config(
                "interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(BeaconError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.modpack.trim().is_empty() {
            return Err(BeaconError::Config("modpack must not be empty".to_string()));
        }
        if self.identity_key.trim().is_empty() {
            return Err(BeaconError::Config(
                "identity_key must not be empty".to_string(),
            ));
        }

        let url = Url::parse(&self.endpoint).map_err(|e| {
            BeaconError::Config(format!("Invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(BeaconError::Config(format!(
                "Endpoint must use http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }
}
