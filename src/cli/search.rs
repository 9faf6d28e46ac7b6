//! Search command.
//!
//! Ranks knowledge base entries for a query.

use serde::{Deserialize, Serialize};

use crate::core::matcher::MatchCandidate;
use crate::engine::Triage;

/// Options for the search command.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Output format for the search command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutput {
    /// Whether the search was successful.
    pub success: bool,
    /// The search query used.
    pub query: String,
    /// Detected language code of the query.
    pub language: String,
    /// Number of results found.
    pub count: usize,
    /// The search results, best first.
    pub results: Vec<SearchResultInfo>,
    /// Error message if search failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Simplified result info for output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultInfo {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    /// Match score.
    pub score: u32,
}

impl From<&MatchCandidate> for SearchResultInfo {
    fn from(candidate: &MatchCandidate) -> Self {
        Self {
            id: candidate.entry.id.clone(),
            question: candidate.entry.question.clone(),
            answer: candidate.entry.answer.clone(),
            category: candidate.entry.category.as_str().to_string(),
            score: candidate.score,
        }
    }
}

impl SearchOutput {
    /// Create a successful output.
    pub fn success(
        query: impl Into<String>,
        language: impl Into<String>,
        results: Vec<SearchResultInfo>,
    ) -> Self {
        let count = results.len();
        Self {
            success: true,
            query: query.into(),
            language: language.into(),
            count,
            results,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            query: query.into(),
            language: String::new(),
            count: 0,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The search command implementation.
pub struct SearchCommand<'a> {
    triage: &'a Triage,
}

impl<'a> SearchCommand<'a> {
    pub fn new(triage: &'a Triage) -> Self {
        Self { triage }
    }

    /// Run the search command with the given query.
    pub fn run(&self, query: &str, options: &SearchOptions) -> SearchOutput {
        let trimmed_query = query.trim();
        if trimmed_query.is_empty() {
            return SearchOutput::failure("", "Search query cannot be empty");
        }
        if options.limit == Some(0) {
            return SearchOutput::failure(trimmed_query, "Limit must be at least 1");
        }

        let language = self.triage.detect_language(trimmed_query);
        let results: Vec<SearchResultInfo> = self
            .triage
            .rank_knowledge_base(trimmed_query, options.limit)
            .iter()
            .map(SearchResultInfo::from)
            .collect();

        SearchOutput::success(trimmed_query, language.code(), results)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &SearchOutput, options: &SearchOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &SearchOutput) -> String {
        if !output.success {
            return format!(
                "Search failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.results.is_empty() {
            return format!("No entries found for query: \"{}\"\n", output.query);
        }

        let mut lines = Vec::new();
        lines.push(format!(
            "Found {} entr{} for query: \"{}\" ({})\n",
            output.count,
            if output.count == 1 { "y" } else { "ies" },
            output.query,
            output.language
        ));

        for (i, result) in output.results.iter().enumerate() {
            lines.push(format!(
                "{}. [{}] {} (score: {})",
                i + 1,
                result.category,
                result.question,
                result.score
            ));
            lines.push(format!("   {}", result.answer));
            lines.push(format!("   ID: {}", result.id));
            lines.push(String::new());
        }

        lines.join("\n")
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
    fn test_search_finds_password_entry() {
        let triage = triage();
        let cmd = SearchCommand::new(&triage);
        let output = cmd.run("Как сбросить пароль?", &SearchOptions::default());

        assert!(output.success);
        assert_eq!(output.language, "ru");
        assert_eq!(output.results[0].id, "faq-1");
        assert!(output.results[0].score >= 8);
    }

    #[test]
    fn test_search_respects_limit() {
        let triage = triage();
        let cmd = SearchCommand::new(&triage);
        let options = SearchOptions {
            limit: Some(1),
            ..Default::default()
        };
        let output = cmd.run("пароль заказ доставка отпуск", &options);

        assert!(output.success);
        assert!(output.count <= 1);
    }

    #[test]
    fn test_search_unrelated_is_empty() {
        let triage = triage();
        let cmd = SearchCommand::new(&triage);
        let output = cmd.run("Расскажите про квантовую механику", &SearchOptions::default());

        assert!(output.success);
        assert_eq!(output.count, 0);
        let formatted = cmd.format_output(&output, &SearchOptions::default());
        assert!(formatted.contains("No entries found"));
    }

    #[test]
    fn test_search_empty_query() {
        let triage = triage();
        let cmd = SearchCommand::new(&triage);
        let output = cmd.run("   ", &SearchOptions::default());

        assert!(!output.success);
        assert!(output.error.is_some());
    }

    #[test]
    fn test_search_zero_limit() {
        let triage = triage();
        let cmd = SearchCommand::new(&triage);
        let options = SearchOptions {
            limit: Some(0),
            ..Default::default()
        };
        assert!(!cmd.run("пароль", &options).success);
    }

    #[test]
    fn test_format_json_and_quiet() {
        let triage = triage();
        let cmd = SearchCommand::new(&triage);
        let output = cmd.run("Как сбросить пароль?", &SearchOptions::default());

        let json = cmd.format_output(
            &output,
            &SearchOptions {
                json: true,
                ..Default::default()
            },
        );
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["results"][0]["id"], "faq-1");

        let quiet = cmd.format_output(
            &output,
            &SearchOptions {
                quiet: true,
                ..Default::default()
            },
        );
        assert!(quiet.is_empty());
    }
}
