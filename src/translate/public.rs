//! Public translation endpoint client.
//!
//! Calls `GET {endpoint}/translate_a/single?client=gtx&sl=auto&tl=..&dt=t&q=..`
//! and joins the translated segments from the nested-array reply.

use std::time::Duration;

use tracing::debug;

use crate::config::TranslationConfig;
use crate::error::{Result, TriageError};
use crate::translate::traits::Translator;

/// Translator backed by the public translation endpoint.
#[derive(Debug, Clone)]
pub struct PublicTranslator {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl PublicTranslator {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| TriageError::capability(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }
}

/// Join `data[0][i][0]` strings from the endpoint's reply.
///
/// Returns `None` when the shape is wrong or nothing was translated.
pub fn join_segments(data: &serde_json::Value) -> Option<String> {
    let segments = data.get(0)?.as_array()?;
    let joined: String = segments
        .iter()
        .filter_map(|part| part.get(0).and_then(|s| s.as_str()))
        .collect();

    (!joined.is_empty()).then_some(joined)
}

impl Translator for PublicTranslator {
    fn translate(&self, text: &str, target: &str) -> Result<String> {
        debug!(target_lang = target, "calling public translation endpoint");

        let response = self
            .client
            .get(format!("{}/translate_a/single", self.endpoint))
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(TriageError::capability(format!(
                "HTTP {} from translation endpoint",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json()?;
        Ok(join_segments(&data).unwrap_or_else(|| text.to_string()))
    }

    fn name(&self) -> &'static str {
        "public"
    }
}
