//! PIN verification interface.

use super::pin::PinCode;
use crate::child::{ChildId, ChildIdentity};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// One verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyPinRequest {
    pub child_id: ChildId,
    pub pin: PinCode,
}

/// Outcome of a verification the service actually answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinVerdict {
    /// PIN accepted. Carries the canonical identity held by the service.
    Verified(ChildIdentity),
    /// PIN (or profile) rejected. No reason is exposed to the child.
    Rejected,
}

/// Confirms or rejects a child's PIN.
///
/// Implementations return `Ok(PinVerdict::Rejected)` for a wrong PIN and
/// `Err(_)` for transport failures. The entry machine treats both the same
/// way.
#[async_trait]
pub trait PinVerifier: Send + Sync {
    async fn verify(&self, request: &VerifyPinRequest) -> Result<PinVerdict>;
}
