//! Helpfulness ratings over HTTP.

use crate::api_client::ApiClient;
use async_trait::async_trait;
use nia_core::error::Result;
use nia_core::feedback::{FeedbackRequest, FeedbackService};
use serde::Serialize;

const SERVICE: &str = "feedback";

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireMessageId<'a> {
    Number(i64),
    Text(&'a str),
}

impl<'a> From<&'a str> for WireMessageId<'a> {
    fn from(id: &'a str) -> Self {
        id.parse()
            .map(WireMessageId::Number)
            .unwrap_or(WireMessageId::Text(id))
    }
}

#[derive(Debug, Serialize)]
struct FeedbackBody<'a> {
    message_id: WireMessageId<'a>,
    rating: i8,
}

/// `POST /conversation/feedback`. The response body is not inspected.
#[derive(Debug, Clone)]
pub struct HttpFeedbackClient {
    api: ApiClient,
}

impl HttpFeedbackClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FeedbackService for HttpFeedbackClient {
    async fn submit(&self, request: &FeedbackRequest) -> Result<()> {
        let body = FeedbackBody {
            message_id: request.message_id.as_str().into(),
            rating: request.rating.value(),
        };
        let _: serde_json::Value = self
            .api
            .post_json(SERVICE, "/conversation/feedback", &body)
            .await?;
        Ok(())
    }
}
