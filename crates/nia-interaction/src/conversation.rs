//! Conversation turns over HTTP.

use crate::api_client::ApiClient;
use async_trait::async_trait;
use nia_core::conversation::{
    AssistantService, ContinuityToken, FollowUpOption, FollowUpPrompt, SourceCitation, TurnReply,
    TurnRequest, VisualContent,
};
use nia_core::error::Result;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "conversation";

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<&'a str>,
    child_id: String,
    text: &'a str,
    grade_level: &'a str,
    current_depth: u32,
}

/// Ids arrive as numbers or strings depending on the endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message_id: Option<WireId>,
    #[serde(default)]
    conversation_id: Option<WireId>,
    text: String,
    #[serde(default)]
    tutoring_depth_level: Option<i64>,
    #[serde(default)]
    source_label: Option<String>,
    #[serde(default)]
    source_citations: Vec<CitationRecord>,
    #[serde(default)]
    visual_content: Option<serde_json::Value>,
    #[serde(default)]
    follow_up_prompt: Option<FollowUpRecord>,
    #[serde(default)]
    related_topics: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CitationRecord {
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    snippet: Option<String>,
    /// Web-search citations carry the query instead of a snippet.
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct FollowUpRecord {
    text: String,
    #[serde(default)]
    options: Vec<FollowUpOptionRecord>,
}

#[derive(Debug, Deserialize)]
struct FollowUpOptionRecord {
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum VisualRecord {
    DalleImage {
        image_url: String,
        #[serde(default)]
        prompt: String,
    },
    EmojiVisual {
        emojis: Vec<String>,
    },
    Diagram {
        emojis: Vec<String>,
    },
}

fn visual_from_wire(raw: serde_json::Value) -> Option<VisualContent> {
    match serde_json::from_value::<VisualRecord>(raw) {
        Ok(VisualRecord::DalleImage { image_url, prompt }) => Some(VisualContent::Image {
            url: image_url,
            prompt_description: prompt,
        }),
        Ok(VisualRecord::EmojiVisual { emojis } | VisualRecord::Diagram { emojis }) => {
            Some(VisualContent::EmojiSet { emojis })
        }
        Err(e) => {
            tracing::debug!(error = %e, "Dropping unsupported visual content");
            None
        }
    }
}

impl From<MessageResponse> for TurnReply {
    fn from(response: MessageResponse) -> Self {
        TurnReply {
            text: response.text,
            visual: response.visual_content.and_then(visual_from_wire),
            source_label: response.source_label.filter(|l| !l.is_empty()),
            sources: response
                .source_citations
                .into_iter()
                .map(|c| SourceCitation {
                    title: c.title,
                    kind: c.kind,
                    snippet: c.snippet.or(c.query).filter(|s| !s.is_empty()),
                    verified: c.verified,
                })
                .collect(),
            follow_up: response.follow_up_prompt.map(|f| FollowUpPrompt {
                text: f.text,
                options: f
                    .options
                    .into_iter()
                    .map(|o| FollowUpOption { id: o.id, text: o.text })
                    .collect(),
            }),
            related_topics: response.related_topics,
            continuity_token: response
                .conversation_id
                .map(|id| ContinuityToken::new(id.into_string())),
            message_id: response.message_id.map(WireId::into_string),
            depth: response
                .tutoring_depth_level
                .and_then(|d| u32::try_from(d).ok()),
        }
    }
}

/// `POST /conversation/message`.
///
/// The service's `conversation_id` is the continuity token; its
/// `tutoring_depth_level` is the next depth.
#[derive(Debug, Clone)]
pub struct HttpAssistantClient {
    api: ApiClient,
}

impl HttpAssistantClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AssistantService for HttpAssistantClient {
    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply> {
        let body = MessageBody {
            conversation_id: request.continuity_token.as_ref().map(|t| t.as_str()),
            child_id: request.child_id.to_string(),
            text: &request.text,
            grade_level: &request.grade_level,
            current_depth: request.depth,
        };

        let response: MessageResponse = self
            .api
            .post_json(SERVICE, "/conversation/message", &body)
            .await?;
        Ok(response.into())
    }
}
