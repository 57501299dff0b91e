//! Session repository trait.
//!
//! Defines where the active session lives between process restarts.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// An abstract repository for persisting the single active session.
///
/// Scope is per device: one slot, overwritten on every `save`.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Loads the persisted session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: A session was persisted
    /// - `Ok(None)`: Nothing persisted (or the stored record is unusable)
    /// - `Err(_)`: Error occurred during retrieval
    async fn load(&self) -> Result<Option<Session>>;

    /// Persists the session, replacing any previous one.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Removes the persisted session.
    ///
    /// Deleting when nothing is stored is not an error.
    async fn delete(&self) -> Result<()>;
}

/// Process-local repository. Sessions do not survive a restart.
///
/// Used when the device is configured for isolated sessions, and in tests.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository that already holds a session, as if persisted earlier.
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn load(&self) -> Result<Option<Session>> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slot.clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(session.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        Ok(())
    }
}
