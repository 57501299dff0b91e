//! Remote assistant interface.

use super::message::{FollowUpPrompt, SourceCitation, VisualContent};
use crate::child::ChildId;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier the assistant service uses to thread turns together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuityToken(String);

impl ContinuityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One outgoing turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    /// Absent on the first turn of a conversation.
    pub continuity_token: Option<ContinuityToken>,
    pub child_id: ChildId,
    pub grade_level: String,
    /// Already trimmed, never empty.
    pub text: String,
    pub depth: u32,
}

/// The assistant's answer to a turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnReply {
    pub text: String,
    pub visual: Option<VisualContent>,
    pub source_label: Option<String>,
    pub sources: Vec<SourceCitation>,
    pub follow_up: Option<FollowUpPrompt>,
    pub related_topics: Vec<String>,
    /// Token to send with the next turn. `None` keeps the current one.
    pub continuity_token: Option<ContinuityToken>,
    /// Service-side id of the reply, needed to submit feedback.
    pub message_id: Option<String>,
    /// Depth to forward next. Only the service moves this value.
    pub depth: Option<u32>,
}

/// Produces assistant replies. Generation logic is entirely remote.
#[async_trait]
pub trait AssistantService: Send + Sync {
    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply>;
}
