//! Generative text capability trait.
//!
//! The triage core never talks to a model API directly. Everything goes
//! through `Completion`, which takes a system prompt, a user prompt and a
//! few options and returns text. Structured output is plain text that
//! parses as JSON.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// Reserved reply meaning "hand this to an operator".
pub const OPERATOR_REQUIRED: &str = "OPERATOR_REQUIRED";

/// A single request to the generative capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Ask for a JSON object reply.
    pub structured_output: bool,
}

impl CompletionRequest {
    /// Create a free-text request.
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.7,
            max_tokens: None,
            structured_output: false,
        }
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the reply token limit.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Request a JSON object reply.
    pub fn structured(mut self) -> Self {
        self.structured_output = true;
        self
    }
}

/// Trait for generative text capabilities.
///
/// Implementations must apply their own per-call timeout and report a
/// timeout as `TriageError::Capability`. All implementations must be
/// thread-safe.
pub trait Completion: Send + Sync {
    /// Run one completion and return the reply text.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Capability name for logging.
    fn name(&self) -> &'static str;

    /// Whether a call could possibly succeed.
    ///
    /// Used by callers that pick a different fallback for "not configured"
    /// than for "configured but failing".
    fn is_available(&self) -> bool {
        true
    }
}

/// Blanket implementation for boxed trait objects.
impl Completion for Box<dyn Completion> {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Blanket implementation for Arc-wrapped capabilities.
impl<T: Completion + ?Sized> Completion for Arc<T> {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Capability used when nothing is configured. Every call is `Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl Completion for Unconfigured {
    fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        Err(TriageError::CapabilityUnavailable)
    }

    fn name(&self) -> &'static str {
        "unconfigured"
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Run a structured request and parse the reply as JSON.
///
/// Markdown code fences around the JSON are tolerated.
pub fn complete_json(
    capability: &dyn Completion,
    request: &CompletionRequest,
) -> Result<serde_json::Value> {
    let text = capability.complete(request)?;
    parse_json_reply(&text)
}

/// Parse a reply that should contain a JSON document.
pub fn parse_json_reply(text: &str) -> Result<serde_json::Value> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|e| TriageError::capability(format!("reply is not valid JSON: {}", e)))
}

/// Result of an answer-generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Generation {
    /// The capability produced an answer.
    Answered(String),
    /// The capability declined; an operator must answer.
    Deferred,
}

impl Generation {
    /// Interpret generation reply text.
    ///
    /// Empty replies and any reply mentioning the reserved token are deferrals.
    pub fn from_reply(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty()
            || trimmed
                .to_lowercase()
                .contains(&OPERATOR_REQUIRED.to_lowercase())
        {
            Generation::Deferred
        } else {
            Generation::Answered(trimmed.to_string())
        }
    }
}

/// Interpret a yes/no judgment reply by its leading word.
///
/// Anything other than a leading "ДА"/"YES" counts as no.
pub fn is_affirmative(reply: &str) -> bool {
    let first = reply
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_uppercase();
    first == "ДА" || first == "YES"
}
