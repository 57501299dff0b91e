//! Crash-safe single-file TOML storage.

use nia_core::error::NiaError;
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write as IoWrite};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during atomic TOML operations.
#[derive(Debug, Error)]
pub enum AtomicTomlError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Lock error on {}: {message}", .path.display())]
    Lock { path: PathBuf, message: String },
}

impl From<AtomicTomlError> for NiaError {
    fn from(err: AtomicTomlError) -> Self {
        match err {
            AtomicTomlError::Parse(e) => e.into(),
            AtomicTomlError::Serialize(e) => e.into(),
            other => NiaError::io(other.to_string()),
        }
    }
}

type Result<T> = std::result::Result<T, AtomicTomlError>;

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> AtomicTomlError {
    let path = path.to_path_buf();
    move |source| AtomicTomlError::Io { path, source }
}

/// A handle to one TOML file.
///
/// - Writes go to a sibling tmp file, are fsynced, then renamed over the target
/// - `save` and `remove` hold an exclusive `fs2` lock on `<file>.lock`
/// - A missing or blank file reads as `None`
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_at(&self.path)(e)),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Saves data atomically under the file lock, creating parent
    /// directories as needed.
    pub fn save(&self, data: &T) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;

        let toml_string = toml::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path).map_err(io_at(&tmp_path))?;
        tmp_file
            .write_all(toml_string.as_bytes())
            .map_err(io_at(&tmp_path))?;
        tmp_file.sync_all().map_err(io_at(&tmp_path))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path).map_err(io_at(&self.path))?;
        Ok(())
    }

    /// Removes the file. Removing a missing file is not an error.
    pub fn remove(&self) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_at(&self.path)(e)),
        }
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let invalid = |what: &str| AtomicTomlError::Io {
            path: self.path.clone(),
            source: std::io::Error::new(ErrorKind::InvalidInput, what.to_string()),
        };
        let parent = self
            .path
            .parent()
            .ok_or_else(|| invalid("Path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| invalid("Path has no file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Exclusive lock on `<file>.lock`, released (and the lock file removed) on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(io_at(parent))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_at(&lock_path))?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| AtomicTomlError::Lock {
                path: lock_path.clone(),
                message: e.to_string(),
            })?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
