//! Resolve command.
//!
//! Attempts an automatic answer and reports whether it may close a ticket.

use serde::Serialize;

use crate::core::resolver::{Outcome, ResolutionContext, ResolutionDecision};
use crate::engine::Triage;

/// Options for the resolve command.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Ticket category, passed to open generation.
    pub category: Option<String>,
    /// Ticket type, passed to open generation.
    pub ticket_type: Option<String>,
    /// Department name, passed to open generation.
    pub department: Option<String>,
}

impl ResolveOptions {
    fn context(&self) -> Option<ResolutionContext> {
        if self.category.is_none() && self.ticket_type.is_none() && self.department.is_none() {
            return None;
        }
        Some(ResolutionContext {
            category: self.category.clone(),
            ticket_type: self.ticket_type.clone(),
            department: self.department.clone(),
        })
    }
}

/// Output format for the resolve command.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// The question asked.
    pub question: String,
    /// The resolution decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<ResolutionDecision>,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolveOutput {
    /// Create a successful output.
    pub fn success(question: impl Into<String>, decision: ResolutionDecision) -> Self {
        Self {
            success: true,
            question: question.into(),
            decision: Some(decision),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(question: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            question: question.into(),
            decision: None,
            error: Some(error.into()),
        }
    }
}

/// The resolve command implementation.
pub struct ResolveCommand<'a> {
    triage: &'a Triage,
}

impl<'a> ResolveCommand<'a> {
    pub fn new(triage: &'a Triage) -> Self {
        Self { triage }
    }

    /// Resolve the given question.
    pub fn run(&self, question: &str, options: &ResolveOptions) -> ResolveOutput {
        let question = question.trim();
        if question.is_empty() {
            return ResolveOutput::failure("", "Question cannot be empty");
        }

        let context = options.context();
        let decision = self.triage.resolve_automatically(question, context.as_ref());
        ResolveOutput::success(question, decision)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ResolveOutput, options: &ResolveOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &ResolveOutput) -> String {
        let decision = match (&output.decision, output.success) {
            (Some(d), true) => d,
            _ => {
                return format!(
                    "Resolve failed: {}\n",
                    output.error.as_deref().unwrap_or("unknown error")
                );
            }
        };

        let mut lines = Vec::new();
        match decision.outcome() {
            Outcome::Answered => {
                lines.push(format!(
                    "Answered (confidence: {:.2}, auto-close: {})",
                    decision.confidence(),
                    if decision.should_auto_close() { "yes" } else { "no" }
                ));
            }
            Outcome::Deferred => lines.push("Deferred to an operator".to_string()),
        }
        if let Some(source) = decision.source_entry_id() {
            lines.push(format!("Source: {}", source));
        }
        if !decision.answer_text().is_empty() {
            lines.push(String::new());
            lines.push(decision.answer_text().to_string());
        }
        lines.push(String::new());

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ScriptedCompletion, ScriptedReply, Unconfigured};
    use crate::core::KnowledgeBase;
    use std::sync::Arc;

    const ANSWER: &str = "Чтобы сбросить пароль, откройте страницу входа и нажмите \
         \"Забыли пароль?\".";
    const SIGNALS: &str = r#"{"isRelevant": true, "isAccurate": true, "isSimple": true,
        "isComplete": true, "needsMoreInfo": false, "canAutoClose": true, "confidence": 0.9}"#;

    #[test]
    fn test_resolve_offline_defers() {
        let triage = Triage::new(Arc::new(Unconfigured), KnowledgeBase::sample());
        let cmd = ResolveCommand::new(&triage);
        let output = cmd.run("Как сбросить пароль?", &ResolveOptions::default());

        assert!(output.success);
        let decision = output.decision.as_ref().unwrap();
        assert_eq!(decision.outcome(), Outcome::Deferred);
        assert!(!decision.should_auto_close());

        let formatted = cmd.format_output(&output, &ResolveOptions::default());
        assert!(formatted.starts_with("Deferred"));
        assert!(formatted.contains("Source: faq-1"));
    }

    #[test]
    fn test_resolve_answers_and_closes() {
        let cap = ScriptedCompletion::new(vec![
            ScriptedReply::text("ДА"),
            ScriptedReply::text(ANSWER),
            ScriptedReply::text(SIGNALS),
        ]);
        let triage = Triage::new(Arc::new(cap), KnowledgeBase::sample());
        let cmd = ResolveCommand::new(&triage);
        let options = ResolveOptions {
            json: true,
            ..Default::default()
        };
        let output = cmd.run("Как сбросить пароль?", &options);
        let parsed: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &options)).unwrap();

        assert_eq!(parsed["decision"]["outcome"], "answered");
        assert_eq!(parsed["decision"]["should_auto_close"], true);
        assert_eq!(parsed["decision"]["source_entry_id"], "faq-1");
    }

    #[test]
    fn test_context_passed_to_open_generation() {
        let cap = Arc::new(ScriptedCompletion::always("OPERATOR_REQUIRED"));
        let triage = Triage::new(cap.clone(), KnowledgeBase::sample());
        let cmd = ResolveCommand::new(&triage);
        let options = ResolveOptions {
            department: Some("Бухгалтерия".to_string()),
            ..Default::default()
        };
        let output = cmd.run("Расскажите про квантовую механику", &options);

        assert_eq!(output.decision.unwrap().outcome(), Outcome::Deferred);
        assert!(cap.requests()[0].user_prompt.contains("Бухгалтерия"));
    }

    #[test]
    fn test_resolve_empty_question() {
        let triage = Triage::new(Arc::new(Unconfigured), KnowledgeBase::sample());
        let cmd = ResolveCommand::new(&triage);
        assert!(!cmd.run(" ", &ResolveOptions::default()).success);
    }
}
