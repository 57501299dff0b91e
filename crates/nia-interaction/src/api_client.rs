//! Shared JSON-over-HTTP plumbing.

use nia_core::error::{NiaError, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest error body kept in a `Service` error message.
const MAX_ERROR_BODY: usize = 200;

/// Base URL, bearer credentials and per-request timeout shared by every
/// nia HTTP client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, bearer_token: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
            timeout,
        }
    }

    /// Overrides the timeout for clients with their own bound (conversation turns).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        path: &str,
    ) -> Result<T> {
        let response = self.send(service, self.client.get(self.url(path))).await?;
        Self::decode(service, response).await
    }

    pub(crate) async fn post_json<B, T>(&self, service: &'static str, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.url(path)).json(body);
        let response = self.send(service, request).await?;
        Self::decode(service, response).await
    }

    /// Sends the request, mapping transport failures and non-2xx statuses.
    async fn send(&self, service: &'static str, mut request: RequestBuilder) -> Result<Response> {
        request = request.timeout(self.timeout);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NiaError::timeout(service, self.timeout)
            } else {
                NiaError::service(service, None, format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::debug!(service, status = status.as_u16(), "API returned an error status");
        Err(NiaError::service(
            service,
            Some(status.as_u16()),
            error_detail(&body),
        ))
    }

    async fn decode<T: DeserializeOwned>(service: &'static str, response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                NiaError::service(service, None, "timed out reading response")
            } else {
                NiaError::service(service, None, format!("invalid response body: {e}"))
            }
        })
    }
}

/// Extracts `detail` from an error body when present, else a bounded prefix.
fn error_detail(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));

    match detail {
        Some(detail) => detail,
        None => body.chars().take(MAX_ERROR_BODY).collect(),
    }
}
