//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml` in the nia config
//! directory, writing a default file on first run.

use crate::dto::{CONFIG_ROOT_ENTITY, create_config_root_migrator};
use crate::paths::NiaPaths;
use nia_core::config::RootConfig;
use nia_core::error::Result;
use std::path::Path;
use std::sync::{Arc, RwLock};
use version_migrate::{FileStorage, FileStorageStrategy, FormatStrategy, LoadBehavior};

/// Loads and caches the root configuration.
#[derive(Clone)]
pub struct ConfigService {
    paths: NiaPaths,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// The configuration is loaded lazily on first access.
    pub fn new(paths: NiaPaths) -> Self {
        Self {
            paths,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// An unreadable or invalid file is logged and replaced by defaults for
    /// this run; the file itself is left untouched.
    pub fn get_config(&self) -> RootConfig {
        if let Some(cached) = self
            .config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            return cached.clone();
        }

        let loaded = self.load_config().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load config.toml, using defaults");
            RootConfig::default()
        });

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = Some(loaded.clone());
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn load_config(&self) -> Result<RootConfig> {
        let config_path = self.paths.config_file()?;
        let mut storage = open_storage(&config_path)?;

        let configs: Vec<RootConfig> = storage.query(CONFIG_ROOT_ENTITY)?;
        match configs.into_iter().next() {
            Some(config) => Ok(config),
            None => {
                let default_config = RootConfig::default();
                storage.update_and_save(CONFIG_ROOT_ENTITY, vec![default_config.clone()])?;
                tracing::info!(path = %config_path.display(), "Created default config");
                Ok(default_config)
            }
        }
    }
}

/// `config.toml` as versioned TOML, created empty when missing.
fn open_storage(config_path: &Path) -> Result<FileStorage> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let migrator = create_config_root_migrator()?;
    let strategy = FileStorageStrategy::new()
        .with_format(FormatStrategy::Toml)
        .with_load_behavior(LoadBehavior::CreateIfMissing);

    Ok(FileStorage::new(config_path.to_path_buf(), migrator, strategy)?)
}
