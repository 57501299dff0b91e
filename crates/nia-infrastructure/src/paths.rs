//! Unified path management for nia configuration files.
//!
//! ```text
//! ~/.config/nia/               # Config directory (platform default)
//! ├── config.toml              # Application configuration
//! ├── secret.json              # Guardian credentials
//! └── session.toml             # The signed-in child (per device)
//! ```

use nia_core::error::{NiaError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "nia";

/// Resolves every file nia reads or writes.
///
/// By default everything lives under the platform config directory
/// (`dirs::config_dir()`). A base directory override replaces that root,
/// which is how tests and portable installs keep their files apart.
#[derive(Debug, Clone, Default)]
pub struct NiaPaths {
    base_dir: Option<PathBuf>,
}

impl NiaPaths {
    /// Creates a resolver. `None` uses the platform config directory.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    /// Resolver rooted at `dir`.
    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self::new(Some(dir.as_ref().to_path_buf()))
    }

    /// Returns the nia configuration directory.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if no override is set and the platform config
    /// directory cannot be determined.
    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.base_dir {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| NiaError::config("Cannot find home directory")),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Path to the guardian credentials.
    ///
    /// # Security Note
    ///
    /// This file holds a bearer token in plaintext; keep it user-readable only.
    pub fn secret_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    pub fn session_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("session.toml"))
    }
}
