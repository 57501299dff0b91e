//! Core domain of the Nia child session lifecycle.
//!
//! PIN-gated sign-in ([`auth`]) establishes a [`session::Session`] in the
//! [`session::SessionStore`]; a [`conversation::ConversationEngine`] then runs
//! turns against the remote assistant, and a [`feedback::FeedbackTracker`]
//! rates individual replies. Remote collaborators are traits implemented in
//! `nia-interaction`; persistence lives in `nia-infrastructure`.

pub mod auth;
pub mod child;
pub mod config;
pub mod conversation;
pub mod error;
pub mod feedback;
pub mod session;

// Re-export common error type
pub use error::{NiaError, Result};
