//! Translate command.

use serde::{Deserialize, Serialize};

use crate::engine::Triage;

/// Options for the translate command.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Target language code.
    pub target: String,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            json: false,
            quiet: false,
            target: "en".to_string(),
        }
    }
}

/// Output format for the translate command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateOutput {
    pub success: bool,
    pub target: String,
    /// Source text.
    pub text: String,
    /// Translated text. Equal to `text` when no translator succeeded.
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslateOutput {
    pub fn success(
        target: impl Into<String>,
        text: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            target: target.into(),
            text: text.into(),
            translation: translation.into(),
            error: None,
        }
    }

    pub fn failure(target: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            target: target.into(),
            text: String::new(),
            translation: String::new(),
            error: Some(error.into()),
        }
    }
}

/// The translate command implementation.
pub struct TranslateCommand<'a> {
    triage: &'a Triage,
}

impl<'a> TranslateCommand<'a> {
    pub fn new(triage: &'a Triage) -> Self {
        Self { triage }
    }

    /// Translate `text` into the target language.
    pub fn run(&self, text: &str, options: &TranslateOptions) -> TranslateOutput {
        let target = options.target.trim().to_lowercase();
        if target.is_empty() {
            return TranslateOutput::failure("", "Target language cannot be empty");
        }

        let translation = self.triage.translate(text, &target);
        TranslateOutput::success(target, text, translation)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &TranslateOutput, options: &TranslateOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else if output.success {
            format!("{}\n", output.translation)
        } else {
            format!(
                "Translation failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ScriptedCompletion, Unconfigured};
    use crate::core::KnowledgeBase;
    use std::sync::Arc;

    #[test]
    fn test_translate_offline_is_identity() {
        let triage = Triage::new(Arc::new(Unconfigured), KnowledgeBase::sample());
        let cmd = TranslateCommand::new(&triage);
        let output = cmd.run("Привет", &TranslateOptions::default());

        assert!(output.success);
        assert_eq!(output.translation, "Привет");
    }

    #[test]
    fn test_translate_with_capability() {
        let triage = Triage::new(
            Arc::new(ScriptedCompletion::always("Hello")),
            KnowledgeBase::sample(),
        );
        let cmd = TranslateCommand::new(&triage);
        let options = TranslateOptions {
            target: " EN ".to_string(),
            ..Default::default()
        };
        let output = cmd.run("Привет", &options);

        assert_eq!(output.target, "en");
        assert_eq!(cmd.format_output(&output, &options), "Hello\n");
    }

    #[test]
    fn test_translate_empty_target() {
        let triage = Triage::new(Arc::new(Unconfigured), KnowledgeBase::sample());
        let cmd = TranslateCommand::new(&triage);
        let options = TranslateOptions {
            target: String::new(),
            ..Default::default()
        };
        assert!(!cmd.run("Привет", &options).success);
    }
}
