//! The conversation turn protocol.

use super::message::{Message, MessageId, Rating};
use super::service::{AssistantService, ContinuityToken, TurnReply, TurnRequest};
use super::state::ConversationState;
use crate::child::ChildIdentity;
use crate::error::{NiaError, Result};
use crate::session::SessionStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

/// Appended in place of a reply when a turn fails for any reason.
pub const FALLBACK_REPLY: &str = "Oops! I had trouble understanding that. Can you try asking again?";

/// Result of a submitted turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The child's own message, appended before the request went out.
    pub child_message: MessageId,
    /// The assistant message appended afterwards.
    pub reply: Message,
    /// True when `reply` is the local fallback rather than a service answer.
    pub fallback: bool,
}

/// Feedback-relevant view of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FeedbackTarget {
    /// Ratable; carries the service-side id.
    Open { remote_id: String },
    /// Already rated.
    Rated(Rating),
}

/// Drives one conversation for one signed-in child.
///
/// Owns the message log for the lifetime of a chat screen visit. A new child
/// (or a return to the chat screen) gets a fresh engine with an empty log and
/// no continuity token.
///
/// # Turn protocol
///
/// 1. The child's message is appended unconditionally.
/// 2. One request goes out, carrying the continuity token and depth.
/// 3. The reply (or, on any failure, [`FALLBACK_REPLY`]) is appended.
///
/// At most one turn is in flight; a second `submit_turn` during that window
/// returns `Busy` and changes nothing.
pub struct ConversationEngine {
    child: ChildIdentity,
    sessions: Arc<SessionStore>,
    assistant: Arc<dyn AssistantService>,
    state: RwLock<ConversationState>,
    draft: Mutex<String>,
    awaiting: AtomicBool,
    timeout: Duration,
}

impl ConversationEngine {
    /// Opens a conversation for the child in the active session.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` if nobody is signed in.
    pub fn new(
        sessions: Arc<SessionStore>,
        assistant: Arc<dyn AssistantService>,
        timeout: Duration,
    ) -> Result<Self> {
        let session = sessions.require()?;
        tracing::debug!(child_id = %session.child.id, "Opening conversation");

        Ok(Self {
            child: session.child,
            sessions,
            assistant,
            state: RwLock::new(ConversationState::new()),
            draft: Mutex::new(String::new()),
            awaiting: AtomicBool::new(false),
            timeout,
        })
    }

    /// The child this conversation belongs to.
    pub fn child(&self) -> &ChildIdentity {
        &self.child
    }

    /// True while a turn is waiting for the assistant.
    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting.load(Ordering::Acquire)
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.messages().to_vec()
    }

    pub async fn message(&self, id: MessageId) -> Option<Message> {
        self.state.read().await.message(id).cloned()
    }

    pub async fn continuity_token(&self) -> Option<ContinuityToken> {
        self.state.read().await.continuity_token().cloned()
    }

    pub async fn depth(&self) -> u32 {
        self.state.read().await.depth()
    }

    pub fn draft(&self) -> String {
        self.draft.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.lock().unwrap_or_else(|e| e.into_inner()) = text.into();
    }

    /// Submits the composed draft as a turn.
    pub async fn submit_draft(&self) -> Result<TurnOutcome> {
        let draft = self.draft();
        self.submit_turn(&draft).await
    }

    /// Sends one turn to the assistant.
    ///
    /// # Errors
    ///
    /// Nothing is appended and no request is sent when:
    /// - `text` is empty after trimming (`Validation`)
    /// - the session no longer belongs to this conversation's child
    /// - another turn is in flight (`Busy`)
    ///
    /// Service failures and timeouts are not errors: they produce the
    /// fallback reply.
    pub async fn submit_turn(&self, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NiaError::validation("message text is empty"));
        }
        self.sessions.require_child(&self.child)?;

        let _in_flight = InFlight::acquire(&self.awaiting).ok_or(NiaError::Busy("conversation turn"))?;

        let (child_message, request) = {
            let mut state = self.state.write().await;
            let id = state.next_id();
            state.push(Message::child(id, text));
            let request = TurnRequest {
                continuity_token: state.continuity_token().cloned(),
                child_id: self.child.id,
                grade_level: self.child.grade_level.clone(),
                text: text.to_string(),
                depth: state.depth(),
            };
            (id, request)
        };
        self.set_draft(String::new());

        tracing::info!(
            child_id = %self.child.id,
            depth = request.depth,
            threaded = request.continuity_token.is_some(),
            "Sending conversation turn"
        );

        let result = match tokio::time::timeout(self.timeout, self.assistant.send_turn(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(NiaError::timeout("conversation", self.timeout)),
        };

        let mut state = self.state.write().await;
        let reply_id = state.next_id();
        let outcome = match result {
            Ok(reply) => {
                state.adopt_token(reply.continuity_token.clone());
                state.adopt_depth(reply.depth);
                let message = reply_message(reply_id, reply);
                state.push(message.clone());
                TurnOutcome {
                    child_message,
                    reply: message,
                    fallback: false,
                }
            }
            Err(e) => {
                tracing::warn!(child_id = %self.child.id, error = %e, "Conversation turn failed");
                let message = Message::assistant(reply_id, FALLBACK_REPLY);
                state.push(message.clone());
                TurnOutcome {
                    child_message,
                    reply: message,
                    fallback: true,
                }
            }
        };
        Ok(outcome)
    }

    pub(crate) async fn feedback_target(&self, id: MessageId) -> Result<FeedbackTarget> {
        let state = self.state.read().await;
        let message = state
            .message(id)
            .ok_or_else(|| NiaError::not_found("message", id.to_string()))?;

        if !message.is_assistant() {
            return Err(NiaError::validation("only assistant messages can be rated"));
        }
        if let Some(rating) = message.feedback() {
            return Ok(FeedbackTarget::Rated(rating));
        }
        let remote_id = message
            .remote_id
            .clone()
            .ok_or_else(|| NiaError::validation("message has no service id to rate"))?;
        Ok(FeedbackTarget::Open { remote_id })
    }

    /// Returns false if the message was already rated.
    pub(crate) async fn record_feedback(&self, id: MessageId, rating: Rating) -> Result<bool> {
        let mut state = self.state.write().await;
        let message = state
            .message_mut(id)
            .ok_or_else(|| NiaError::not_found("message", id.to_string()))?;
        Ok(message.set_feedback(rating))
    }
}

fn reply_message(id: MessageId, reply: TurnReply) -> Message {
    let mut message = Message::assistant(id, reply.text);
    message.visual = reply.visual;
    message.source_label = reply.source_label;
    message.sources = reply.sources;
    message.follow_up = reply.follow_up;
    message.related_topics = reply.related_topics;
    message.remote_id = reply.message_id;
    message
}

/// Holds the single-flight flag for the duration of a turn.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
