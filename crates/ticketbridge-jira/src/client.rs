// SPDX-FileCopyrightText: 2026 Ticketbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Jira Cloud REST v3 API.
//!
//! Provides [`JiraClient`], which owns authentication, timeouts, status code
//! checks and error mapping. Reads are retried once on transient errors
//! (429, 500, 502, 503, 504); writes are not retried.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use ticketbridge_core::BridgeError;

use crate::types::ApiErrorResponse;

/// Longest error body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

/// Low-level Jira HTTP client.
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl JiraClient {
    /// Creates a client using basic auth with an account email and API token.
    pub fn new(
        base_url: &str,
        email: &str,
        api_token: &str,
        timeout: Duration,
    ) -> Result<Self, BridgeError> {
        let credentials = STANDARD.encode(format!("{email}:{api_token}"));
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| BridgeError::Config(format!("invalid Jira credentials: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the delay between read retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base}/rest/api/3/{path}` expecting 200, retried on transient errors.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, key: &str) -> Result<T, BridgeError> {
        let mut attempt = 0;
        loop {
            let response = self.send(self.request(Method::GET, path)).await?;
            let status = response.status();
            debug!(%status, path, attempt, "Jira response received");

            if status == StatusCode::OK {
                return decode(response).await;
            }
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(%status, path, "transient Jira error, will retry");
                attempt += 1;
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }
            return Err(error_for(response, key).await);
        }
    }

    /// Sends `body` as JSON and checks for `expected`. Returns the response
    /// for callers that read a body.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        key: &str,
        body: &B,
        expected: StatusCode,
    ) -> Result<Response, BridgeError> {
        let response = self.send(self.request(method, path).json(body)).await?;
        let status = response.status();
        debug!(%status, path, "Jira response received");
        if status != expected {
            return Err(error_for(response, key).await);
        }
        Ok(response)
    }

    /// Uploads one file as multipart form data, expecting 200.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<T, BridgeError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self
            .request(Method::POST, path)
            .header("X-Atlassian-Token", "no-check")
            .multipart(form);

        let response = self.send(request).await?;
        let status = response.status();
        debug!(%status, path, filename, "Jira upload response received");
        if status != StatusCode::OK {
            return Err(error_for(response, key).await);
        }
        decode(response).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/api/3/{path}", self.base_url))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BridgeError> {
        request.send().await.map_err(|e| BridgeError::Transport {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Reads and parses a JSON body.
pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BridgeError> {
    let body = response.text().await.map_err(|e| BridgeError::Transport {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })?;
    serde_json::from_str(&body).map_err(|e| BridgeError::Decode {
        message: format!("failed to parse Jira response: {e}"),
    })
}

/// Maps an unexpected response to an error. 404 means the issue is gone.
async fn error_for(response: Response, key: &str) -> BridgeError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND && !key.is_empty() {
        return BridgeError::NotFound { key: key.into() };
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorResponse>(&body)
        .ok()
        .and_then(|e| e.summary())
        .unwrap_or_else(|| truncate(&body, MAX_ERROR_BODY));
    BridgeError::transport(format!("Jira API returned {status}: {detail}"))
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}
