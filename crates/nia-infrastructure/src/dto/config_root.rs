//! ConfigRoot DTOs and migrations
//!
//! - V1.0.0: api, timeouts, session and debug sections

use nia_core::config::{ApiConfig, DebugConfig, RootConfig, SessionConfig, TimeoutConfig};
use nia_core::error::Result;
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Migrator, Versioned};

/// Entity key of the root configuration.
pub const CONFIG_ROOT_ENTITY: &str = "config_root";

/// Root configuration V1.0.0 (`config.toml`).
///
/// Every section is defaulted so a hand-edited file may omit any of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(default)]
pub struct ConfigRootV1_0_0 {
    pub api: ApiConfig,
    pub timeouts: TimeoutConfig,
    pub session: SessionConfig,
    pub debug: DebugConfig,
}

/// Type alias for the latest ConfigRoot version.
pub type ConfigRoot = ConfigRootV1_0_0;

impl IntoDomain<RootConfig> for ConfigRootV1_0_0 {
    fn into_domain(self) -> RootConfig {
        RootConfig {
            api: self.api,
            timeouts: self.timeouts,
            session: self.session,
            debug: self.debug,
        }
    }
}

impl FromDomain<RootConfig> for ConfigRootV1_0_0 {
    fn from_domain(config: RootConfig) -> Self {
        Self {
            api: config.api,
            timeouts: config.timeouts,
            session: config.session,
            debug: config.debug,
        }
    }
}

/// Creates the migrator for `config.toml`.
///
/// # Migration Path
///
/// - V1.0.0 → RootConfig
pub fn create_config_root_migrator() -> Result<Migrator> {
    let mut migrator = Migrator::builder().build();
    let path = Migrator::define(CONFIG_ROOT_ENTITY)
        .from::<ConfigRootV1_0_0>()
        .into_with_save::<RootConfig>();
    migrator.register(path)?;
    Ok(migrator)
}
