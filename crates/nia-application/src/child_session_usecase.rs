//! Child session use case.
//!
//! Coordinates the Identity Store, PIN verification, the Session Store and
//! the conversation services into the three flows a front end needs:
//! signing in, chatting and signing out.

use anyhow::{Context, Result};
use nia_core::auth::{NO_PROFILES_MESSAGE, PinLogin, PinVerifier};
use nia_core::child::{ChildIdentity, IdentityDirectory};
use nia_core::config::TimeoutConfig;
use nia_core::conversation::{
    AssistantService, ConversationEngine, Message, MessageId, Rating, TurnOutcome,
};
use nia_core::error::NiaError;
use nia_core::feedback::{FeedbackService, FeedbackTracker, RateOutcome};
use nia_core::session::{Session, SessionStore};
use std::sync::Arc;

/// What the identity selection screen should show.
pub enum LoginScreen {
    /// The household has no child profiles.
    NoProfiles,
    /// Profiles to pick from, with a PIN pad for the chosen one.
    Picker(PinLogin),
}

impl LoginScreen {
    /// Text for the empty state, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            LoginScreen::NoProfiles => Some(NO_PROFILES_MESSAGE),
            LoginScreen::Picker(_) => None,
        }
    }
}

/// One visit of the chat screen: a fresh conversation plus its ratings.
pub struct ChatSession {
    engine: Arc<ConversationEngine>,
    tracker: FeedbackTracker,
}

impl ChatSession {
    pub fn child(&self) -> &ChildIdentity {
        self.engine.child()
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }

    /// Sends one turn. Service failures come back as a fallback reply.
    pub async fn send(&self, text: &str) -> nia_core::Result<TurnOutcome> {
        self.engine.submit_turn(text).await
    }

    pub async fn rate(&self, id: MessageId, rating: Rating) -> nia_core::Result<RateOutcome> {
        self.tracker.rate(id, rating).await
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.engine.messages().await
    }
}

/// Use case for the child session lifecycle.
///
/// # Responsibilities
///
/// - Loading profiles and handing out a PIN sign-in for them
/// - Guarding protected screens with the Session Store
/// - Opening a conversation for the signed-in child
/// - Signing out
pub struct ChildSessionUseCase {
    sessions: Arc<SessionStore>,
    directory: Arc<dyn IdentityDirectory>,
    verifier: Arc<dyn PinVerifier>,
    assistant: Arc<dyn AssistantService>,
    feedback: Arc<dyn FeedbackService>,
    timeouts: TimeoutConfig,
}

impl ChildSessionUseCase {
    pub fn new(
        sessions: Arc<SessionStore>,
        directory: Arc<dyn IdentityDirectory>,
        verifier: Arc<dyn PinVerifier>,
        assistant: Arc<dyn AssistantService>,
        feedback: Arc<dyn FeedbackService>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            sessions,
            directory,
            verifier,
            assistant,
            feedback,
            timeouts,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Loads the household's profiles and starts identity selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile list cannot be fetched in time.
    pub async fn begin_login(&self) -> Result<LoginScreen> {
        let timeout = self.timeouts.request();
        let children = tokio::time::timeout(timeout, self.directory.list_children())
            .await
            .unwrap_or_else(|_| Err(NiaError::timeout("children", timeout)))
            .context("Failed to load child profiles")?;

        if children.is_empty() {
            tracing::info!("No child profiles available");
            return Ok(LoginScreen::NoProfiles);
        }

        tracing::debug!(count = children.len(), "Starting identity selection");
        let login = PinLogin::new(
            children,
            self.verifier.clone(),
            self.sessions.clone(),
            timeout,
        )?;
        Ok(LoginScreen::Picker(login))
    }

    /// The signed-in child, if any.
    pub fn current_child(&self) -> Option<ChildIdentity> {
        self.sessions.current().map(|s| s.child)
    }

    /// Guard for protected screens.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in; callers redirect
    /// to identity selection.
    pub fn require_session(&self) -> Result<Session> {
        Ok(self.sessions.require()?)
    }

    /// Opens a new conversation for the signed-in child.
    ///
    /// Every call starts from an empty log with no continuity token.
    pub fn open_chat(&self) -> Result<ChatSession> {
        let engine = Arc::new(
            ConversationEngine::new(
                self.sessions.clone(),
                self.assistant.clone(),
                self.timeouts.turn(),
            )
            .context("Cannot open chat without a signed-in child")?,
        );
        let tracker = FeedbackTracker::new(
            engine.clone(),
            self.feedback.clone(),
            self.timeouts.request(),
        );

        tracing::info!(child_id = %engine.child().id, "Chat opened");
        Ok(ChatSession { engine, tracker })
    }

    /// Signs the child out. Never fails.
    pub async fn logout(&self) {
        self.sessions.clear().await;
    }
}
