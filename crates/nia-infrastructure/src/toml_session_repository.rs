//! TOML-file SessionRepository implementation

use crate::dto::{SESSION_ENTITY, create_session_migrator};
use crate::paths::NiaPaths;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use nia_core::error::{NiaError, Result};
use nia_core::session::{Session, SessionRepository};
use std::path::PathBuf;
use std::sync::Arc;

/// Persists the device's single active session in `session.toml`.
///
/// - Reads and writes through the session `Migrator` (`SessionV1_0_0` on disk)
/// - Unknown versions load as "no session" so an upgrade never blocks startup
/// - Blocking file I/O runs on `spawn_blocking`
pub struct TomlSessionRepository {
    file: Arc<AtomicTomlFile<toml::Value>>,
}

impl TomlSessionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
        }
    }

    /// Repository at the default `session.toml` location.
    pub fn from_paths(paths: &NiaPaths) -> Result<Self> {
        Ok(Self::new(paths.session_file()?))
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&AtomicTomlFile<toml::Value>) -> Result<T> + Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| NiaError::internal(format!("Failed to join task: {}", e)))?
    }
}

fn decode(raw: toml::Value) -> Result<Option<Session>> {
    let migrator = create_session_migrator()?;
    let result: std::result::Result<Session, _> = migrator.load_flat_from(SESSION_ENTITY, raw);
    match result {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring session file that does not migrate");
            Ok(None)
        }
    }
}

fn encode(session: &Session) -> Result<toml::Value> {
    let migrator = create_session_migrator()?;
    let json = migrator.save_domain_flat(SESSION_ENTITY, session)?;
    Ok(serde_json::from_str(&json)?)
}

#[async_trait]
impl SessionRepository for TomlSessionRepository {
    async fn load(&self) -> Result<Option<Session>> {
        let raw = self.blocking(|file| Ok(file.load()?)).await?;
        match raw {
            Some(raw) => decode(raw),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let session = session.clone();
        self.blocking(move |file| {
            let value = encode(&session)?;
            Ok(file.save(&value)?)
        })
        .await?;
        tracing::debug!(path = %self.file.path().display(), "Session persisted");
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        self.blocking(|file| Ok(file.remove()?)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nia_core::child::ChildIdentity;
    use nia_core::session::SessionStore;
    use tempfile::TempDir;

    fn repo(dir: &TempDir) -> TomlSessionRepository {
        TomlSessionRepository::from_paths(&NiaPaths::at(dir.path())).unwrap()
    }

    #[tokio::test]
    async fn test_save_load_delete() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir);
        let session = Session::new(ChildIdentity::new(1, "Ava", "3rd"));

        assert!(repo.load().await.unwrap().is_none());

        repo.save(&session).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), Some(session));

        repo.delete().await.unwrap();
        assert!(repo.load().await.unwrap().is_none());
        assert!(!dir.path().join("session.toml").exists());
    }

    #[tokio::test]
    async fn test_unknown_version_is_no_session() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("session.toml"),
            "version = \"9.0.0\"\nchild_id = 1\n",
        )
        .unwrap();

        assert!(repo(&dir).load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_is_versioned_flat_record() {
        let dir = TempDir::new().unwrap();
        let session = Session::new(ChildIdentity::new(4, "Mia", "1st"));
        repo(&dir).save(&session).await.unwrap();

        let raw: toml::Value =
            toml::from_str(&std::fs::read_to_string(dir.path().join("session.toml")).unwrap())
                .unwrap();
        assert_eq!(raw["version"].as_str(), Some("1.0.0"));
        assert_eq!(raw["child_id"].as_integer(), Some(4));
        assert_eq!(raw["display_name"].as_str(), Some("Mia"));
        assert!(!dir.path().join("session.lock").exists());
    }

    #[tokio::test]
    async fn test_session_survives_reload() {
        let dir = TempDir::new().unwrap();
        let session = Session::new(ChildIdentity::new(2, "Leo", "K"));

        let store = SessionStore::new(Arc::new(repo(&dir)));
        store.establish(session.clone()).await.unwrap();
        drop(store);

        let reloaded = SessionStore::restore(Arc::new(repo(&dir))).await;
        assert_eq!(reloaded.current(), Some(session));

        reloaded.clear().await;
        let after_logout = SessionStore::restore(Arc::new(repo(&dir))).await;
        assert!(!after_logout.is_authenticated());
    }

    #[tokio::test]
    async fn test_corrupt_file_restores_signed_out() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("session.toml"), "version = ").unwrap();

        assert!(repo(&dir).load().await.is_err());
        let store = SessionStore::restore(Arc::new(repo(&dir))).await;
        assert!(store.current().is_none());
    }
}
