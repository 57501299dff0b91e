//! Session domain model.

use crate::child::ChildIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use version_migrate::DeriveQueryable as Queryable;

/// The authenticated child for the lifetime of a device session.
///
/// Created only from the identity returned by the PIN verifier, so the child
/// it references existed in the Identity Store when the session began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable)]
#[queryable(entity = "session")]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// The signed-in child
    pub child: ChildIdentity,
    /// When the PIN was accepted
    pub established_at: DateTime<Utc>,
}

impl Session {
    /// Starts a new session for a verified child.
    pub fn new(child: ChildIdentity) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            child,
            established_at: Utc::now(),
        }
    }
}
