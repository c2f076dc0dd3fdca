//! Chat-completion client for OpenAI-compatible endpoints.

use super::protocol::{ChatCompletionRequest, ChatCompletionResponse, Message, ToolDefinition};
use crate::error::{ForklineError, Result};
use serde::Deserialize;
use std::time::Duration;

/// A language model that answers a conversation with one assistant message.
pub trait ChatModel: Send + Sync {
    fn complete(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<Message>;
}

/// Blocking [`ChatModel`] over HTTP (`POST {base_url}/chat/completions`).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl OpenAiClient {
    /// Build a client. Without an API key no `Authorization` header is sent,
    /// which suits local OpenAI-compatible servers.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                ForklineError::ConfigError(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> ForklineError {
        if err.is_connect() {
            ForklineError::BackendError(format!("cannot connect to {}: {}", self.endpoint, err))
        } else if err.is_timeout() {
            ForklineError::BackendError(format!("request to {} timed out: {}", self.endpoint, err))
        } else {
            ForklineError::BackendError(err.to_string())
        }
    }
}

impl ChatModel for OpenAiClient {
    fn complete(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<Message> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            tools,
            stream: false,
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| self.map_reqwest_error(e))?;
        let status = response.status();
        let text = response.text().map_err(|e| {
            ForklineError::BackendError(format!("failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            return Err(ForklineError::BackendError(format!(
                "model API returned HTTP {}: {}",
                status.as_u16(),
                error_message(&text)
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            ForklineError::BackendError(format!("failed to parse model response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ForklineError::BackendError("model returned no choices".to_string()))
    }
}

/// Extract `error.message` from an API error body, or return the body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .and_then(|d| d.message)
        .unwrap_or_else(|| body.trim().to_string())
}
