//! Conversation message types.
//!
//! Messages are immutable once appended, except for the feedback rating,
//! which moves from absent to a terminal value at most once.

use crate::error::NiaError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a message in its conversation log, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents the author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    /// Typed by the signed-in child.
    Child,
    /// Produced by the assistant (or the local fallback).
    Assistant,
}

/// Illustration attached to an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisualContent {
    Image {
        url: String,
        prompt_description: String,
    },
    EmojiSet {
        emojis: Vec<String>,
    },
}

/// A helpfulness rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Rating {
    /// Thumbs up (+1)
    Helpful,
    /// Thumbs down (-1)
    NotHelpful,
}

impl Rating {
    pub fn value(self) -> i8 {
        match self {
            Rating::Helpful => 1,
            Rating::NotHelpful => -1,
        }
    }
}

impl From<Rating> for i8 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl TryFrom<i8> for Rating {
    type Error = NiaError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Helpful),
            -1 => Ok(Rating::NotHelpful),
            other => Err(NiaError::validation(format!(
                "rating must be +1 or -1, got {other}"
            ))),
        }
    }
}

/// Where a reply's facts came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub title: String,
    /// e.g. "web_search", "verified_source"
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

/// One choice offered by a follow-up prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpOption {
    pub id: String,
    pub text: String,
}

/// "Want to learn more?" prompt attached to a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpPrompt {
    pub text: String,
    pub options: Vec<FollowUpOption>,
}

/// A single entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceCitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUpPrompt>,
    #[serde(default)]
    pub related_topics: Vec<String>,
    /// Identifier assigned by the assistant service, used for feedback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    feedback: Option<Rating>,
}

impl Message {
    /// A message typed by the child.
    pub fn child(id: MessageId, content: impl Into<String>) -> Self {
        Self::bare(id, MessageRole::Child, content.into())
    }

    /// An assistant message carrying only text.
    pub fn assistant(id: MessageId, content: impl Into<String>) -> Self {
        Self::bare(id, MessageRole::Assistant, content.into())
    }

    fn bare(id: MessageId, role: MessageRole, content: String) -> Self {
        Self {
            id,
            role,
            content,
            visual: None,
            source_label: None,
            sources: Vec::new(),
            follow_up: None,
            related_topics: Vec::new(),
            remote_id: None,
            timestamp: Utc::now(),
            feedback: None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    pub fn feedback(&self) -> Option<Rating> {
        self.feedback
    }

    /// Records the rating if none is present. Returns false if one already was.
    pub(crate) fn set_feedback(&mut self, rating: Rating) -> bool {
        if self.feedback.is_some() {
            return false;
        }
        self.feedback = Some(rating);
        true
    }
}
