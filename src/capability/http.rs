//! OpenAI-compatible chat completion client.
//!
//! Sends `POST {endpoint}/v1/chat/completions` with a bearer token using a
//! blocking client whose timeout is the per-call timeout from config.

use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::capability::traits::{Completion, CompletionRequest};
use crate::config::CapabilityConfig;
use crate::error::{Result, TriageError};

/// HTTP implementation of the generative capability.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    config: CapabilityConfig,
    client: reqwest::blocking::Client,
}

impl ChatCompletionClient {
    /// Create a client from capability config.
    pub fn new(config: CapabilityConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TriageError::capability(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    /// Build the JSON request body.
    fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt},
            ],
            "temperature": request.temperature,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if request.structured_output {
            body["response_format"] = json!({"type": "json_object"});
        }

        body
    }
}

/// Pull the first choice's message content out of a chat completion response.
pub fn extract_content(response: &serde_json::Value) -> Result<String> {
    response
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| TriageError::capability("response has no message content"))
}

impl Completion for ChatCompletionClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if self.config.is_configured() => key,
            _ => return Err(TriageError::CapabilityUnavailable),
        };

        debug!(
            model = %self.config.model,
            structured = request.structured_output,
            "calling chat completion"
        );

        let response = self
            .client
            .post(self.url())
            .bearer_auth(api_key)
            .json(&self.request_body(request))
            .send()?;

        if !response.status().is_success() {
            return Err(TriageError::capability(format!(
                "HTTP {} from chat completion API",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json()?;
        extract_content(&body)
    }

    fn name(&self) -> &'static str {
        "chat-completion"
    }

    fn is_available(&self) -> bool {
        self.config.is_configured()
    }
}
