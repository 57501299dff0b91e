//! Child profile listing and PIN verification over HTTP.

use crate::api_client::ApiClient;
use async_trait::async_trait;
use nia_core::auth::{PinVerdict, PinVerifier, VerifyPinRequest};
use nia_core::child::{ChildId, ChildIdentity, IdentityDirectory};
use nia_core::error::Result;
use serde::{Deserialize, Serialize};

const SERVICE_CHILDREN: &str = "children";
const SERVICE_PIN: &str = "pin verification";

/// Statuses the verify endpoint uses for "not this child / not this PIN".
const REJECTING_STATUSES: [u16; 4] = [400, 401, 403, 404];

#[derive(Debug, Deserialize)]
struct ChildRecord {
    id: u64,
    display_name: String,
    #[serde(default)]
    grade_level: String,
    #[serde(default = "active_by_default")]
    is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl From<ChildRecord> for ChildIdentity {
    fn from(record: ChildRecord) -> Self {
        ChildIdentity::new(ChildId(record.id), record.display_name, record.grade_level)
    }
}

#[derive(Debug, Serialize)]
struct VerifyPinBody<'a> {
    child_id: u64,
    pin: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyPinResponse {
    verified: bool,
    child: Option<ChildRecord>,
}

/// Household profiles from `GET /children/`. Inactive profiles are skipped.
#[derive(Debug, Clone)]
pub struct HttpIdentityDirectory {
    api: ApiClient,
}

impl HttpIdentityDirectory {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityDirectory for HttpIdentityDirectory {
    async fn list_children(&self) -> Result<Vec<ChildIdentity>> {
        let records: Vec<ChildRecord> = self.api.get_json(SERVICE_CHILDREN, "/children/").await?;
        let children: Vec<ChildIdentity> = records
            .into_iter()
            .filter(|r| r.is_active)
            .map(ChildIdentity::from)
            .collect();

        tracing::debug!(count = children.len(), "Loaded child profiles");
        Ok(children)
    }
}

/// `POST /children/verify-pin`.
///
/// A rejecting status or `verified: false` is a [`PinVerdict::Rejected`];
/// anything else that goes wrong is an error.
#[derive(Debug, Clone)]
pub struct HttpPinVerifier {
    api: ApiClient,
}

impl HttpPinVerifier {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PinVerifier for HttpPinVerifier {
    async fn verify(&self, request: &VerifyPinRequest) -> Result<PinVerdict> {
        let body = VerifyPinBody {
            child_id: request.child_id.0,
            pin: request.pin.expose(),
        };

        let response: VerifyPinResponse = match self
            .api
            .post_json(SERVICE_PIN, "/children/verify-pin", &body)
            .await
        {
            Ok(response) => response,
            Err(e) if e.status().is_some_and(|s| REJECTING_STATUSES.contains(&s)) => {
                tracing::debug!(child_id = %request.child_id, status = ?e.status(), "PIN rejected");
                return Ok(PinVerdict::Rejected);
            }
            Err(e) => return Err(e),
        };

        match response {
            VerifyPinResponse {
                verified: true,
                child: Some(child),
            } => Ok(PinVerdict::Verified(child.into())),
            _ => Ok(PinVerdict::Rejected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nia_core::auth::PinCode;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> ApiClient {
        ApiClient::new(server.uri(), None, Duration::from_secs(5))
    }

    fn request(pin: &str) -> VerifyPinRequest {
        VerifyPinRequest {
            child_id: ChildId(1),
            pin: PinCode::parse(pin).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_list_children_skips_inactive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/children/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "display_name": "Ava", "grade_level": "2nd", "first_name": "Ava" },
                { "id": 2, "display_name": "Leo", "grade_level": "K", "is_active": false },
            ])))
            .mount(&server)
            .await;

        let children = HttpIdentityDirectory::new(api(&server))
            .list_children()
            .await
            .unwrap();

        assert_eq!(children, vec![ChildIdentity::new(1, "Ava", "2nd")]);
    }

    #[tokio::test]
    async fn test_verified_uses_returned_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/children/verify-pin"))
            .and(body_json(json!({ "child_id": 1, "pin": "4321" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "verified": true,
                "child": { "id": 1, "display_name": "Avery", "grade_level": "3rd" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let verdict = HttpPinVerifier::new(api(&server))
            .verify(&request("4321"))
            .await
            .unwrap();

        assert_eq!(
            verdict,
            PinVerdict::Verified(ChildIdentity::new(1, "Avery", "3rd"))
        );
    }

    #[tokio::test]
    async fn test_wrong_pin_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/children/verify-pin"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid PIN" })),
            )
            .mount(&server)
            .await;

        let verdict = HttpPinVerifier::new(api(&server))
            .verify(&request("0000"))
            .await
            .unwrap();

        assert_eq!(verdict, PinVerdict::Rejected);
    }

    #[tokio::test]
    async fn test_server_error_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = HttpPinVerifier::new(api(&server))
            .verify(&request("4321"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_verified_false_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "verified": false })))
            .mount(&server)
            .await;

        let verdict = HttpPinVerifier::new(api(&server))
            .verify(&request("4321"))
            .await
            .unwrap();

        assert_eq!(verdict, PinVerdict::Rejected);
    }
}
