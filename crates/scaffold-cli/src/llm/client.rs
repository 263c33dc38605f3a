//! HTTP client for the model provider's messages API.
//!
//! Kept deliberately small: one completion call, cancellable mid-flight.
//! Prompt wording lives with the strategies, not here.

use tokio_util::sync::CancellationToken;

use super::types::{Message, MessageRequest, MessageResponse};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Errors from a completion call
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The request never completed
    #[error("request failed: {0}")]
    Transport(String),

    /// The service rejected the credentials
    #[error("authentication rejected (status {0})")]
    Auth(u16),

    /// The service returned a non-success status
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be parsed
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The call was aborted via the cancellation token
    #[error("request cancelled")]
    Cancelled,
}

/// Client for one provider endpoint and model.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    /// Create a client for the default endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
        }
    }

    /// Override the endpoint base URL (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The configured model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one completion and return the concatenated text content.
    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(system.to_string()),
            messages: vec![Message::user(prompt)],
        };

        let send = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            response = send => response.map_err(|e| LlmError::Transport(e.to_string()))?,
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LlmError::Auth(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessageResponse = tokio::select! {
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            body = response.json::<MessageResponse>() => {
                body.map_err(|e| LlmError::Parse(e.to_string()))?
            }
        };

        Ok(parsed.text())
    }
}
