//! Session file DTOs and migrations
//!
//! - V1.0.0: the signed-in child and when the session began

use chrono::{DateTime, Utc};
use nia_core::child::{ChildId, ChildIdentity};
use nia_core::error::Result;
use nia_core::session::Session;
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Migrator, Versioned};

/// Entity key of the session record.
pub const SESSION_ENTITY: &str = "session";

/// Session file V1.0.0 (`session.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct SessionV1_0_0 {
    pub session_id: String,
    pub child_id: u64,
    pub display_name: String,
    #[serde(default)]
    pub grade_level: String,
    pub established_at: DateTime<Utc>,
}

/// Type alias for the latest session file version.
pub type SessionFile = SessionV1_0_0;

impl IntoDomain<Session> for SessionV1_0_0 {
    fn into_domain(self) -> Session {
        Session {
            id: self.session_id,
            child: ChildIdentity::new(ChildId(self.child_id), self.display_name, self.grade_level),
            established_at: self.established_at,
        }
    }
}

impl FromDomain<Session> for SessionV1_0_0 {
    fn from_domain(session: Session) -> Self {
        Self {
            session_id: session.id,
            child_id: session.child.id.0,
            display_name: session.child.display_name,
            grade_level: session.child.grade_level,
            established_at: session.established_at,
        }
    }
}

/// Creates the migrator for the session file.
///
/// # Migration Path
///
/// - V1.0.0 → Session
pub fn create_session_migrator() -> Result<Migrator> {
    let mut migrator = Migrator::builder().build();
    let path = Migrator::define(SESSION_ENTITY)
        .from::<SessionV1_0_0>()
        .into_with_save::<Session>();
    migrator.register(path)?;
    Ok(migrator)
}
