//! Conversation state owned by one chat screen visit.

use super::message::{Message, MessageId};
use super::service::ContinuityToken;

/// Depth forwarded on the first turn of a brand-new conversation.
pub const INITIAL_DEPTH: u32 = 1;

/// Append-only message log plus the threading data for the next turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
    continuity_token: Option<ContinuityToken>,
    depth: u32,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            continuity_token: None,
            depth: INITIAL_DEPTH,
        }
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn continuity_token(&self) -> Option<&ContinuityToken> {
        self.continuity_token.as_ref()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Id the next appended message will get.
    pub fn next_id(&self) -> MessageId {
        MessageId(self.messages.len() as u64 + 1)
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub(crate) fn message_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    pub(crate) fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Keeps the current token when the service does not send a new one.
    pub(crate) fn adopt_token(&mut self, token: Option<ContinuityToken>) {
        if let Some(token) = token {
            self.continuity_token = Some(token);
        }
    }

    /// Values below 1 are ignored.
    pub(crate) fn adopt_depth(&mut self, depth: Option<u32>) {
        if let Some(depth) = depth.filter(|d| *d >= INITIAL_DEPTH) {
            self.depth = depth;
        }
    }
}
