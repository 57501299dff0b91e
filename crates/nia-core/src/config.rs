//! Root configuration model (`config.toml`).
//!
//! Every section and field is defaulted, so a partial or empty file is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use version_migrate::DeriveQueryable as Queryable;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, Queryable)]
#[queryable(entity = "config_root")]
#[serde(default)]
pub struct RootConfig {
    pub api: ApiConfig,
    pub timeouts: TimeoutConfig,
    pub session: SessionConfig,
    pub debug: DebugConfig,
}

/// Remote service location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Prefix for every endpoint, without a trailing slash.
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Bounds for remote calls. Expiry is handled as a request failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Profile listing, PIN verification and feedback.
    pub request_secs: u64,
    /// One conversation turn.
    pub turn_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            turn_secs: 60,
        }
    }
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs.max(1))
    }

    pub fn turn(&self) -> Duration {
        Duration::from_secs(self.turn_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Keep the signed-in child across restarts. `false` isolates the
    /// session to the running process.
    pub persist: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { persist: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
