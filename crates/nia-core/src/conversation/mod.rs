//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `message`: `Message` and its attachments (visuals, sources, follow-ups)
//! - `service`: the remote `AssistantService` interface and turn DTOs
//! - `state`: the append-only `ConversationState`
//! - `engine`: `ConversationEngine`, the single-flight turn protocol

mod engine;
mod message;
mod service;
mod state;

pub(crate) use engine::FeedbackTarget;
pub use engine::{ConversationEngine, FALLBACK_REPLY, TurnOutcome};
pub use message::{
    FollowUpOption, FollowUpPrompt, Message, MessageId, MessageRole, Rating, SourceCitation,
    VisualContent,
};
pub use service::{AssistantService, ContinuityToken, TurnReply, TurnRequest};
pub use state::{ConversationState, INITIAL_DEPTH};
