use crate::conversation::Rating;
use crate::error::Result;
use async_trait::async_trait;

/// One rating submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    /// Service-side id of the rated reply.
    pub message_id: String,
    pub rating: Rating,
}

/// Accepts ratings. The response body carries nothing the client needs.
#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn submit(&self, request: &FeedbackRequest) -> Result<()>;
}
