//! At-most-once helpfulness ratings.

use super::service::{FeedbackRequest, FeedbackService};
use crate::conversation::{ConversationEngine, FeedbackTarget, MessageId, Rating};
use crate::error::{NiaError, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Result of a [`FeedbackTracker::rate`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateOutcome {
    /// The service accepted the rating and it is now stored on the message.
    Recorded(Rating),
    /// The message was already rated; nothing was sent.
    AlreadyRecorded(Rating),
}

impl RateOutcome {
    /// The rating now stored on the message.
    pub fn rating(self) -> Rating {
        match self {
            RateOutcome::Recorded(r) | RateOutcome::AlreadyRecorded(r) => r,
        }
    }
}

/// Submits ratings for assistant replies in one conversation.
///
/// The remote call happens first; the message's feedback field is written only
/// after the service accepts it. The first successful rating is final.
pub struct FeedbackTracker {
    engine: Arc<ConversationEngine>,
    service: Arc<dyn FeedbackService>,
    pending: Mutex<HashSet<MessageId>>,
    timeout: Duration,
}

impl FeedbackTracker {
    pub fn new(
        engine: Arc<ConversationEngine>,
        service: Arc<dyn FeedbackService>,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            service,
            pending: Mutex::new(HashSet::new()),
            timeout,
        }
    }

    /// Rates an assistant message.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the message does not exist
    /// - `Validation` for child messages and replies without a service id
    /// - `Busy` while another rating of the same message is in flight
    /// - the service or timeout error if submission failed; nothing is recorded
    pub async fn rate(&self, id: MessageId, rating: Rating) -> Result<RateOutcome> {
        // Claimed before the target is read, so no second caller can observe
        // `Open` once this one has recorded.
        let _pending = PendingRating::acquire(&self.pending, id)?;

        let remote_id = match self.engine.feedback_target(id).await? {
            FeedbackTarget::Rated(existing) => {
                tracing::debug!(message_id = %id, "Message already rated, not resending");
                return Ok(RateOutcome::AlreadyRecorded(existing));
            }
            FeedbackTarget::Open { remote_id } => remote_id,
        };

        let request = FeedbackRequest {
            message_id: remote_id,
            rating,
        };
        let sent = match tokio::time::timeout(self.timeout, self.service.submit(&request)).await {
            Ok(result) => result,
            Err(_) => Err(NiaError::timeout("feedback", self.timeout)),
        };
        if let Err(e) = sent {
            tracing::warn!(message_id = %id, error = %e, "Feedback not recorded");
            return Err(e);
        }

        if self.engine.record_feedback(id, rating).await? {
            tracing::info!(message_id = %id, rating = rating.value(), "Feedback recorded");
            Ok(RateOutcome::Recorded(rating))
        } else {
            // Unreachable while the pending set single-flights per message
            let existing = self.engine.message(id).await.and_then(|m| m.feedback());
            Ok(RateOutcome::AlreadyRecorded(existing.unwrap_or(rating)))
        }
    }

    /// Rating currently stored on the message, if any.
    pub async fn rating_of(&self, id: MessageId) -> Option<Rating> {
        self.engine.message(id).await.and_then(|m| m.feedback())
    }
}

struct PendingRating<'a> {
    pending: &'a Mutex<HashSet<MessageId>>,
    id: MessageId,
}

impl<'a> PendingRating<'a> {
    fn acquire(pending: &'a Mutex<HashSet<MessageId>>, id: MessageId) -> Result<Self> {
        let inserted = pending.lock().unwrap_or_else(|e| e.into_inner()).insert(id);
        if !inserted {
            return Err(NiaError::Busy("feedback"));
        }
        Ok(Self { pending, id })
    }
}

impl Drop for PendingRating<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::child::ChildIdentity;
    use crate::conversation::{AssistantService, ContinuityToken, TurnReply, TurnRequest};
    use crate::session::{MemorySessionRepository, Session, SessionStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    // Every reply gets service id "7".
    struct FixedAssistant {
        fail: bool,
    }

    #[async_trait]
    impl AssistantService for FixedAssistant {
        async fn send_turn(&self, _request: &TurnRequest) -> Result<TurnReply> {
            if self.fail {
                return Err(NiaError::service("conversation", Some(502), "bad gateway"));
            }
            Ok(TurnReply {
                text: "Seahorse dads carry the babies!".to_string(),
                continuity_token: Some(ContinuityToken::new("abc123")),
                message_id: Some("7".to_string()),
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    struct RecordingFeedback {
        requests: Mutex<Vec<FeedbackRequest>>,
        fail: AtomicBool,
        gate: Option<Arc<Notify>>,
    }

    impl RecordingFeedback {
        fn requests(&self) -> Vec<FeedbackRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedbackService for RecordingFeedback {
        async fn submit(&self, request: &FeedbackRequest) -> Result<()> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(NiaError::service("feedback", Some(500), "down"));
            }
            Ok(())
        }
    }

    async fn chat(
        assistant_fails: bool,
        feedback: Arc<RecordingFeedback>,
    ) -> (Arc<ConversationEngine>, FeedbackTracker) {
        let sessions = Arc::new(SessionStore::new(Arc::new(MemorySessionRepository::new())));
        sessions
            .establish(Session::new(ChildIdentity::new(1, "Ava", "2nd")))
            .await
            .unwrap();
        let engine = Arc::new(
            ConversationEngine::new(
                sessions,
                Arc::new(FixedAssistant {
                    fail: assistant_fails,
                }),
                Duration::from_secs(5),
            )
            .unwrap(),
        );
        engine.submit_turn("Tell me about seahorses").await.unwrap();
        let tracker = FeedbackTracker::new(engine.clone(), feedback, Duration::from_secs(5));
        (engine, tracker)
    }

    const REPLY: MessageId = MessageId(2);

    #[tokio::test]
    async fn test_second_rating_sends_nothing() {
        let feedback = Arc::new(RecordingFeedback::default());
        let (_engine, tracker) = chat(false, feedback.clone()).await;

        let first = tracker.rate(REPLY, Rating::Helpful).await.unwrap();
        let second = tracker.rate(REPLY, Rating::NotHelpful).await.unwrap();

        assert_eq!(first, RateOutcome::Recorded(Rating::Helpful));
        assert_eq!(second, RateOutcome::AlreadyRecorded(Rating::Helpful));
        assert_eq!(
            feedback.requests(),
            vec![FeedbackRequest {
                message_id: "7".to_string(),
                rating: Rating::Helpful,
            }]
        );
        assert_eq!(tracker.rating_of(REPLY).await, Some(Rating::Helpful));
    }

    #[tokio::test]
    async fn test_failed_submission_records_nothing_and_allows_retry() {
        let feedback = Arc::new(RecordingFeedback::default());
        feedback.fail.store(true, Ordering::SeqCst);
        let (_engine, tracker) = chat(false, feedback.clone()).await;

        assert!(tracker.rate(REPLY, Rating::Helpful).await.unwrap_err().is_remote());
        assert_eq!(tracker.rating_of(REPLY).await, None);

        feedback.fail.store(false, Ordering::SeqCst);
        let retried = tracker.rate(REPLY, Rating::NotHelpful).await.unwrap();

        assert_eq!(retried, RateOutcome::Recorded(Rating::NotHelpful));
        assert_eq!(feedback.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_child_message_cannot_be_rated() {
        let feedback = Arc::new(RecordingFeedback::default());
        let (_engine, tracker) = chat(false, feedback.clone()).await;

        let err = tracker.rate(MessageId(1), Rating::Helpful).await.unwrap_err();

        assert!(err.is_validation());
        assert!(feedback.requests().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_reply_cannot_be_rated() {
        let feedback = Arc::new(RecordingFeedback::default());
        let (_engine, tracker) = chat(true, feedback.clone()).await;

        assert!(tracker.rate(REPLY, Rating::Helpful).await.unwrap_err().is_validation());
        assert!(feedback.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_message() {
        let (_engine, tracker) = chat(false, Arc::new(RecordingFeedback::default())).await;
        assert!(tracker.rate(MessageId(99), Rating::Helpful).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_concurrent_rating_is_busy() {
        let gate = Arc::new(Notify::new());
        let feedback = Arc::new(RecordingFeedback {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let (_engine, tracker) = chat(false, feedback.clone()).await;

        let (first, second) = tokio::join!(tracker.rate(REPLY, Rating::Helpful), async {
            let second = tracker.rate(REPLY, Rating::NotHelpful).await;
            gate.notify_one();
            second
        });

        assert_eq!(first.unwrap(), RateOutcome::Recorded(Rating::Helpful));
        assert!(second.unwrap_err().is_busy());
        assert_eq!(feedback.requests().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_raters_send_one_request() {
        for _ in 0..200 {
            let feedback = Arc::new(RecordingFeedback::default());
            let (_engine, tracker) = chat(false, feedback.clone()).await;
            let tracker = Arc::new(tracker);

            let a = tokio::spawn({
                let tracker = tracker.clone();
                async move { tracker.rate(REPLY, Rating::Helpful).await }
            });
            let b = tokio::spawn({
                let tracker = tracker.clone();
                async move { tracker.rate(REPLY, Rating::NotHelpful).await }
            });
            let outcomes = [a.await.unwrap(), b.await.unwrap()];

            assert_eq!(feedback.requests().len(), 1);
            let recorded = outcomes
                .iter()
                .filter(|o| matches!(o, Ok(RateOutcome::Recorded(_))))
                .count();
            assert_eq!(recorded, 1);
            for outcome in &outcomes {
                match outcome {
                    Ok(_) => {}
                    Err(e) => assert!(e.is_busy()),
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_records_nothing() {
        let feedback = Arc::new(RecordingFeedback {
            gate: Some(Arc::new(Notify::new())),
            ..Default::default()
        });
        let (_engine, tracker) = chat(false, feedback).await;

        let err = tracker.rate(REPLY, Rating::Helpful).await.unwrap_err();

        assert!(matches!(err, NiaError::Timeout { .. }));
        assert_eq!(tracker.rating_of(REPLY).await, None);
    }
}
