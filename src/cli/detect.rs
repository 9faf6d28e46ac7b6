//! Detect command.
//!
//! Reports the language of a text.

use serde::{Deserialize, Serialize};

use crate::core::language::{secondary_marker_count, Language};
use crate::engine::Triage;

/// Options for the detect command.
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the detect command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectOutput {
    pub success: bool,
    /// ISO code of the detected language.
    pub language: Language,
    /// Secondary-language markers found in the text.
    pub markers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectOutput {
    pub fn success(language: Language, markers: usize) -> Self {
        Self {
            success: true,
            language,
            markers,
            error: None,
        }
    }
}

/// The detect command implementation.
pub struct DetectCommand<'a> {
    triage: &'a Triage,
}

impl<'a> DetectCommand<'a> {
    pub fn new(triage: &'a Triage) -> Self {
        Self { triage }
    }

    /// Detect the language of `text`. Empty text is the primary language.
    pub fn run(&self, text: &str, _options: &DetectOptions) -> DetectOutput {
        DetectOutput::success(
            self.triage.detect_language(text),
            secondary_marker_count(text),
        )
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &DetectOutput, options: &DetectOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            format!(
                "{} ({}, {} marker(s))\n",
                output.language.code(),
                output.language.prompt_name(),
                output.markers
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Unconfigured;
    use crate::core::KnowledgeBase;
    use std::sync::Arc;

    fn triage() -> Triage {
        Triage::new(Arc::new(Unconfigured), KnowledgeBase::sample())
    }

    #[test]
    fn test_detect_secondary() {
        let triage = triage();
        let cmd = DetectCommand::new(&triage);
        let output = cmd.run("Сіз қалай?", &DetectOptions::default());

        assert_eq!(output.language, Language::Secondary);
        assert!(output.markers >= 2);
    }

    #[test]
    fn test_detect_json_uses_iso_code() {
        let triage = triage();
        let cmd = DetectCommand::new(&triage);
        let options = DetectOptions {
            json: true,
            ..Default::default()
        };
        let output = cmd.run("Как сбросить пароль?", &options);
        let parsed: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &options)).unwrap();

        assert_eq!(parsed["language"], "ru");
        assert_eq!(parsed["success"], true);
    }

    #[test]
    fn test_detect_human_readable() {
        let triage = triage();
        let cmd = DetectCommand::new(&triage);
        let output = cmd.run("", &DetectOptions::default());
        let formatted = cmd.format_output(&output, &DetectOptions::default());

        assert!(formatted.starts_with("ru (русский"));
    }
}
