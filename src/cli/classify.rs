//! Classify command.
//!
//! Routes ticket text to a department with priority and type.

use serde::{Deserialize, Serialize};

use crate::core::classifier::Classification;
use crate::engine::Triage;

/// Options for the classify command.
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the classify command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// Detected language code of the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Routing verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassifyOutput {
    /// Create a successful output.
    pub fn success(language: impl Into<String>, classification: Classification) -> Self {
        Self {
            success: true,
            language: Some(language.into()),
            classification: Some(classification),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            language: None,
            classification: None,
            error: Some(error.into()),
        }
    }
}

/// The classify command implementation.
pub struct ClassifyCommand<'a> {
    triage: &'a Triage,
}

impl<'a> ClassifyCommand<'a> {
    pub fn new(triage: &'a Triage) -> Self {
        Self { triage }
    }

    /// Classify the given text.
    pub fn run(&self, text: &str, _options: &ClassifyOptions) -> ClassifyOutput {
        let text = text.trim();
        if text.is_empty() {
            return ClassifyOutput::failure("Ticket text cannot be empty");
        }

        let language = self.triage.detect_language(text);
        ClassifyOutput::success(language.code(), self.triage.classify_ticket(text))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ClassifyOutput, options: &ClassifyOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ClassifyOutput) -> String {
        let classification = match (&output.classification, output.success) {
            (Some(c), true) => c,
            _ => {
                return format!(
                    "Classification failed: {}\n",
                    output.error.as_deref().unwrap_or("unknown error")
                );
            }
        };

        let mut lines = Vec::new();
        lines.push(format!(
            "Department: {} ({})",
            classification.department_name, classification.department_id
        ));
        lines.push(format!("Category:   {}", classification.category));
        lines.push(format!("Priority:   {}", classification.priority.as_str()));
        lines.push(format!("Type:       {}", classification.ticket_type.as_str()));
        lines.push(format!("Confidence: {:.2}", classification.confidence));
        if let Some(language) = &output.language {
            lines.push(format!("Language:   {}", language));
        }
        lines.push(String::new());

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ScriptedCompletion, Unconfigured};
    use crate::core::classifier::Priority;
    use crate::core::KnowledgeBase;
    use std::sync::Arc;

    #[test]
    fn test_classify_offline_uses_keyword_rules() {
        let triage = Triage::new(Arc::new(Unconfigured), KnowledgeBase::sample());
        let cmd = ClassifyCommand::new(&triage);
        let output = cmd.run("Срочно! Не могу войти, забыл пароль", &ClassifyOptions::default());

        assert!(output.success);
        let classification = output.classification.unwrap();
        assert_eq!(classification.department_id, "tech");
        assert_eq!(classification.priority, Priority::Urgent);
        assert_eq!(classification.confidence, 0.6);
    }

    #[test]
    fn test_classify_with_capability() {
        let reply = r#"{"category":"Возврат","priority":"high","type":"request","departmentId":"billing","confidence":0.9}"#;
        let triage = Triage::new(
            Arc::new(ScriptedCompletion::always(reply)),
            KnowledgeBase::sample(),
        );
        let cmd = ClassifyCommand::new(&triage);
        let output = cmd.run("Верните деньги", &ClassifyOptions::default());

        let classification = output.classification.unwrap();
        assert_eq!(classification.department_id, "billing");
        assert_eq!(classification.category, "Возврат");
    }

    #[test]
    fn test_classify_empty_text() {
        let triage = Triage::new(Arc::new(Unconfigured), KnowledgeBase::sample());
        let cmd = ClassifyCommand::new(&triage);
        let output = cmd.run("", &ClassifyOptions::default());

        assert!(!output.success);
        let formatted = cmd.format_output(&output, &ClassifyOptions::default());
        assert!(formatted.starts_with("Classification failed"));
    }

    #[test]
    fn test_format_human_readable() {
        let triage = Triage::new(Arc::new(Unconfigured), KnowledgeBase::sample());
        let cmd = ClassifyCommand::new(&triage);
        let output = cmd.run("Хочу оформить отпуск", &ClassifyOptions::default());
        let formatted = cmd.format_output(&output, &ClassifyOptions::default());

        assert!(formatted.contains("(hr)"));
        assert!(formatted.contains("Language:   ru"));
    }
}
