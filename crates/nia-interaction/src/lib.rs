//! HTTP clients for the remote collaborators of a child session.
//!
//! Each client implements one `nia-core` service trait on top of a shared
//! [`ApiClient`]:
//!
//! - [`HttpIdentityDirectory`]: `GET /children/`
//! - [`HttpPinVerifier`]: `POST /children/verify-pin`
//! - [`HttpAssistantClient`]: `POST /conversation/message`
//! - [`HttpFeedbackClient`]: `POST /conversation/feedback`

mod api_client;
mod children;
mod conversation;
mod feedback;

pub use api_client::ApiClient;
pub use children::{HttpIdentityDirectory, HttpPinVerifier};
pub use conversation::HttpAssistantClient;
pub use feedback::HttpFeedbackClient;
