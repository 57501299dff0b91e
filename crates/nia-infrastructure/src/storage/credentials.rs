//! Guardian credential storage.
//!
//! Reads `secret.json` from the nia config directory. The token it holds is
//! attached as a bearer header to every API request; guardian sign-in itself
//! happens elsewhere.

use crate::paths::NiaPaths;
use nia_core::error::{NiaError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Environment variable consulted when `secret.json` carries no token.
pub const GUARDIAN_TOKEN_ENV: &str = "NIA_GUARDIAN_TOKEN";

/// Contents of `secret.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_token: Option<String>,
}

/// Read-only access to guardian credentials.
///
/// # Security Note
///
/// `secret.json` is plaintext; it should be readable by the owning user only.
pub struct GuardianCredentialStorage {
    path: PathBuf,
}

impl GuardianCredentialStorage {
    pub fn new(paths: &NiaPaths) -> Result<Self> {
        Ok(Self {
            path: paths.secret_file()?,
        })
    }

    /// Creates a storage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads `secret.json`. A missing file yields empty credentials.
    pub fn load(&self) -> Result<GuardianCredentials> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(GuardianCredentials::default()),
            Err(e) => Err(NiaError::io(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Token from `secret.json`, else from [`GUARDIAN_TOKEN_ENV`].
    pub fn guardian_token(&self) -> Result<Option<String>> {
        let from_env = std::env::var(GUARDIAN_TOKEN_ENV).ok();
        Ok(resolve_token(self.load()?, from_env))
    }
}

fn resolve_token(credentials: GuardianCredentials, from_env: Option<String>) -> Option<String> {
    credentials
        .guardian_token
        .into_iter()
        .chain(from_env)
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}
