//! The device-wide Session Store.

use super::model::Session;
use super::repository::SessionRepository;
use crate::child::ChildIdentity;
use crate::error::{NiaError, Result};
use std::sync::{Arc, RwLock};

/// Holds the currently authenticated child.
///
/// `SessionStore` is an explicitly owned object handed (via `Arc`) to every
/// component that needs authentication context. It keeps the active session in
/// memory and mirrors it to a `SessionRepository` so it survives a reload.
///
/// - `establish` replaces the session (no-op for an identical identity)
/// - `current` is the guard every protected screen consults
/// - `clear` always succeeds; persistence failures are only logged
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    repository: Arc<dyn SessionRepository>,
}

impl SessionStore {
    /// Creates an empty store. Nothing is read from the repository.
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            current: RwLock::new(None),
            repository,
        }
    }

    /// Re-derives the active session from persisted storage.
    ///
    /// Used on startup: the child is not asked for the PIN again. A repository
    /// read failure is logged and yields an empty store.
    pub async fn restore(repository: Arc<dyn SessionRepository>) -> Self {
        let restored = match repository.load().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load persisted session, starting signed out");
                None
            }
        };

        if let Some(session) = &restored {
            tracing::info!(child_id = %session.child.id, "Restored child session");
        }

        Self {
            current: RwLock::new(restored),
            repository,
        }
    }

    /// Makes `session` the active session and persists it.
    ///
    /// Idempotent: if the active session already holds an identical identity
    /// record, nothing is replaced or written. A re-verified child whose
    /// profile changed (grade, display name) replaces the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails. The session is active in memory
    /// regardless, so the current process stays signed in.
    pub async fn establish(&self, session: Session) -> Result<()> {
        {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            if current.as_ref().is_some_and(|c| c.child == session.child) {
                tracing::debug!(child_id = %session.child.id, "Session already established");
                return Ok(());
            }
            *current = Some(session.clone());
        }

        tracing::info!(child_id = %session.child.id, session_id = %session.id, "Child session established");
        self.repository.save(&session).await
    }

    /// Returns the active session, if any.
    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns the active session or `NotAuthenticated`.
    ///
    /// Screens that render protected content call this and redirect to
    /// identity selection on error.
    pub fn require(&self) -> Result<Session> {
        self.current().ok_or(NiaError::NotAuthenticated)
    }

    /// Checks that the active session still belongs to `child`.
    pub fn require_child(&self, child: &ChildIdentity) -> Result<Session> {
        let session = self.require()?;
        if session.child.id != child.id {
            return Err(NiaError::SessionMismatch {
                expected: child.id.to_string(),
                actual: session.child.id.to_string(),
            });
        }
        Ok(session)
    }

    /// Whether a child is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Signs the child out.
    ///
    /// Always succeeds: the in-memory session is dropped first, and a failure
    /// to delete the persisted copy is logged.
    pub async fn clear(&self) {
        let previous = self
            .current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(session) = previous {
            tracing::info!(child_id = %session.child.id, "Child session cleared");
        }

        if let Err(e) = self.repository.delete().await {
            tracing::warn!(error = %e, "Failed to delete persisted session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ava() -> ChildIdentity {
        ChildIdentity::new(1, "Ava", "2nd")
    }

    // Repository that counts writes and can be told to fail.
    #[derive(Default)]
    struct CountingRepository {
        saves: AtomicUsize,
        deletes: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SessionRepository for CountingRepository {
        async fn load(&self) -> Result<Option<Session>> {
            if self.fail {
                return Err(NiaError::io("disk unavailable"));
            }
            Ok(None)
        }

        async fn save(&self, _session: &Session) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NiaError::io("disk full"));
            }
            Ok(())
        }

        async fn delete(&self) -> Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NiaError::io("disk unavailable"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_establish_then_current() {
        let store = SessionStore::new(Arc::new(MemorySessionRepository::new()));
        assert!(store.current().is_none());
        assert_eq!(store.require(), Err(NiaError::NotAuthenticated));

        let session = Session::new(ava());
        store.establish(session.clone()).await.unwrap();

        assert_eq!(store.current(), Some(session));
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_establish_is_idempotent_for_same_child() {
        let repo = Arc::new(CountingRepository::default());
        let store = SessionStore::new(repo.clone());

        let first = Session::new(ava());
        store.establish(first.clone()).await.unwrap();
        store.establish(Session::new(ava())).await.unwrap();

        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);
        assert_eq!(store.current().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_reverified_child_with_new_grade_replaces_record() {
        let stale = Session::new(ava());
        let repo = Arc::new(MemorySessionRepository::with_session(stale.clone()));
        let store = SessionStore::restore(repo.clone()).await;

        let promoted = ChildIdentity::new(1, "Ava", "3rd");
        store.establish(Session::new(promoted.clone())).await.unwrap();

        assert_eq!(store.current().unwrap().child, promoted);
        assert_ne!(store.current().unwrap().id, stale.id);
        assert_eq!(repo.load().await.unwrap().unwrap().child.grade_level, "3rd");
        assert!(store.require_child(&promoted).is_ok());
    }

    #[tokio::test]
    async fn test_establish_other_child_replaces_session() {
        let store = SessionStore::new(Arc::new(MemorySessionRepository::new()));
        store.establish(Session::new(ava())).await.unwrap();

        let leo = ChildIdentity::new(2, "Leo", "K");
        store.establish(Session::new(leo.clone())).await.unwrap();

        assert_eq!(store.current().unwrap().child, leo);
        assert!(matches!(
            store.require_child(&ava()),
            Err(NiaError::SessionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_clear_then_current_is_none() {
        let repo = Arc::new(MemorySessionRepository::new());
        let store = SessionStore::new(repo.clone());
        store.establish(Session::new(ava())).await.unwrap();

        store.clear().await;

        assert!(store.current().is_none());
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_succeeds_when_repository_fails() {
        let repo = Arc::new(CountingRepository {
            fail: true,
            ..Default::default()
        });
        let store = SessionStore::new(repo.clone());

        // Persistence fails but the process is still signed in
        assert!(store.establish(Session::new(ava())).await.is_err());
        assert!(store.is_authenticated());

        store.clear().await;
        assert!(store.current().is_none());
        assert_eq!(repo.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_when_empty() {
        let store = SessionStore::new(Arc::new(MemorySessionRepository::new()));
        store.clear().await;
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_restore_reads_persisted_session() {
        let session = Session::new(ava());
        let repo = Arc::new(MemorySessionRepository::with_session(session.clone()));

        let store = SessionStore::restore(repo).await;

        assert_eq!(store.current(), Some(session));
    }

    #[tokio::test]
    async fn test_restore_failure_starts_signed_out() {
        let repo = Arc::new(CountingRepository {
            fail: true,
            ..Default::default()
        });
        let store = SessionStore::restore(repo).await;
        assert!(store.current().is_none());
    }
}
