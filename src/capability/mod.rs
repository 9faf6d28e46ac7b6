//! Generative text capability.
//!
//! - `traits`: the `Completion` trait, request type and reply helpers
//! - `http`: OpenAI-compatible chat completion client
//! - `scripted`: canned replies for tests

pub mod http;
pub mod scripted;
pub mod traits;

pub use http::ChatCompletionClient;
pub use scripted::{ScriptedCompletion, ScriptedReply};
pub use traits::{
    complete_json, is_affirmative, parse_json_reply, Completion, CompletionRequest, Generation,
    Unconfigured, OPERATOR_REQUIRED,
};

use tracing::{debug, warn};

use crate::config::CapabilityConfig;

/// Build the capability described by config.
///
/// Without a usable credential this is `Unconfigured`, so every caller
/// takes its deterministic fallback.
pub fn from_config(config: &CapabilityConfig) -> Box<dyn Completion> {
    if !config.is_configured() {
        debug!("no capability credential configured");
        return Box::new(Unconfigured);
    }

    match ChatCompletionClient::new(config.clone()) {
        Ok(client) => Box::new(client),
        Err(e) => {
            warn!("failed to build capability client: {} (using unconfigured)", e);
            Box::new(Unconfigured)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_without_key_is_unconfigured() {
        let cap = from_config(&CapabilityConfig::default());
        assert_eq!(cap.name(), "unconfigured");
        assert!(!cap.is_available());
    }

    #[test]
    fn test_from_config_disabled_is_unconfigured() {
        let config = CapabilityConfig {
            enabled: false,
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert_eq!(from_config(&config).name(), "unconfigured");
    }

    #[test]
    fn test_from_config_with_key() {
        let config = CapabilityConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let cap = from_config(&config);
        assert_eq!(cap.name(), "chat-completion");
        assert!(cap.is_available());
    }
}
