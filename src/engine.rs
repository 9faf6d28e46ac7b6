//! Triage facade.
//!
//! Bundles the capability, the knowledge base and the translator so callers
//! do not thread them through every call. Every operation here is total.

use std::sync::Arc;

use tracing::debug;

use crate::capability::{self, Completion};
use crate::config::Config;
use crate::core::assist::{self, TicketContext};
use crate::core::classifier::{self, Classification};
use crate::core::knowledge::{KnowledgeBase, KnowledgeEntry};
use crate::core::language::{self, Language};
use crate::core::matcher::{self, MatchCandidate};
use crate::core::resolver::{ResolutionContext, ResolutionDecision, Resolver, DEFAULT_RESOLVER_LIMIT};
use crate::error::Result;
use crate::translate::{self, CompletionTranslator, RoutedTranslator};

/// Default interactive search limit.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Triage engine.
pub struct Triage {
    capability: Arc<dyn Completion>,
    kb: KnowledgeBase,
    translator: RoutedTranslator,
    search_limit: usize,
    resolver_limit: usize,
}

impl Triage {
    /// Engine with no public translation endpoint and default limits.
    pub fn new(capability: Arc<dyn Completion>, kb: KnowledgeBase) -> Self {
        let translator = RoutedTranslator::new(
            None,
            Box::new(CompletionTranslator::new(Arc::clone(&capability))),
        );
        Self {
            capability,
            kb,
            translator,
            search_limit: DEFAULT_SEARCH_LIMIT,
            resolver_limit: DEFAULT_RESOLVER_LIMIT,
        }
    }

    /// Build the engine from configuration.
    ///
    /// Fails only when a configured knowledge base file cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self> {
        let kb = match &config.matcher.knowledge_base {
            Some(path) => KnowledgeBase::load_from_file(path)?,
            None => KnowledgeBase::sample(),
        };
        let capability: Arc<dyn Completion> = Arc::from(capability::from_config(&config.capability));
        let translator = translate::from_config(&config.translation, Arc::clone(&capability));

        debug!(
            capability = capability.name(),
            entries = kb.len(),
            "triage engine ready"
        );

        Ok(Self {
            capability,
            kb,
            translator,
            search_limit: config.matcher.default_limit.max(1),
            resolver_limit: config.matcher.resolver_limit.max(1),
        })
    }

    /// Replace the translator.
    pub fn with_translator(mut self, translator: RoutedTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn capability(&self) -> &dyn Completion {
        self.capability.as_ref()
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit
    }

    /// Classify ticket text for routing.
    pub fn classify_ticket(&self, text: &str) -> Classification {
        classifier::classify(self.capability.as_ref(), text)
    }

    /// Try to answer a question without an operator.
    pub fn resolve_automatically(
        &self,
        question: &str,
        context: Option<&ResolutionContext>,
    ) -> ResolutionDecision {
        Resolver::new(self.capability.as_ref(), &self.kb)
            .with_limit(self.resolver_limit)
            .resolve(question, context)
    }

    /// Generate an answer without consulting the knowledge base.
    pub fn resolve_open(
        &self,
        question: &str,
        context: Option<&ResolutionContext>,
    ) -> ResolutionDecision {
        Resolver::new(self.capability.as_ref(), &self.kb).resolve_open_with(question, context)
    }

    /// Knowledge entries for a query, best first.
    pub fn search_knowledge_base(&self, query: &str, limit: Option<usize>) -> Vec<KnowledgeEntry> {
        matcher::search(&self.kb, query, limit.unwrap_or(self.search_limit))
    }

    /// Knowledge entries with scores, best first.
    pub fn rank_knowledge_base(&self, query: &str, limit: Option<usize>) -> Vec<MatchCandidate> {
        matcher::rank(&self.kb, query, limit.unwrap_or(self.search_limit))
    }

    pub fn detect_language(&self, text: &str) -> Language {
        language::detect(text)
    }

    pub fn suggest_replies(
        &self,
        description: &str,
        history: &[String],
        count: usize,
        context: Option<&TicketContext>,
    ) -> Vec<String> {
        assist::suggest_replies(self.capability.as_ref(), description, history, count, context)
    }

    pub fn summarize(&self, messages: &[String]) -> String {
        assist::summarize(self.capability.as_ref(), messages)
    }

    /// Translate text; returns the input unchanged on failure.
    pub fn translate(&self, text: &str, target: &str) -> String {
        self.translator.translate(text, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ScriptedCompletion, Unconfigured};
    use crate::core::resolver::Outcome;
    use std::fs;
    use tempfile::TempDir;

    fn offline() -> Triage {
        Triage::new(Arc::new(Unconfigured), KnowledgeBase::sample())
    }

    #[test]
    fn test_search_uses_default_limit() {
        let triage = offline();
        let results = triage.search_knowledge_base("Как сбросить пароль?", None);
        assert_eq!(results[0].id, "faq-1");
        assert!(results.len() <= DEFAULT_SEARCH_LIMIT);
    }

    #[test]
    fn test_offline_operations_are_total() {
        let triage = offline();
        assert_eq!(triage.classify_ticket("Добрый день").department_id, "general");
        assert_eq!(
            triage.resolve_automatically("Как сбросить пароль?", None).outcome(),
            Outcome::Deferred
        );
        assert_eq!(triage.translate("Привет", "en"), "Привет");
        assert_eq!(triage.suggest_replies("x", &[], 3, None).len(), 3);
        assert_eq!(triage.detect_language("Сіз қалай?"), Language::Secondary);
    }

    #[test]
    fn test_translate_through_capability() {
        let triage = Triage::new(
            Arc::new(ScriptedCompletion::always("Hello")),
            KnowledgeBase::sample(),
        );
        assert_eq!(triage.translate("Привет", "en"), "Hello");
    }

    #[test]
    fn test_from_config_defaults() {
        let mut config = Config::default();
        config.capability.api_key = None;
        config.translation.enabled = false;

        let triage = Triage::from_config(&config).unwrap();
        assert_eq!(triage.knowledge_base().len(), 7);
        assert!(!triage.capability().is_available());
    }

    #[test]
    fn test_from_config_loads_knowledge_base() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kb.toml");
        fs::write(
            &path,
            "[[entries]]\nid = \"kb-1\"\nquestion = \"Где взять справку?\"\n\
             answer = \"В отделе кадров.\"\ncategory = \"hr\"\nkeywords = [\"справка\"]\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.matcher.knowledge_base = Some(path);
        config.matcher.default_limit = 2;

        let triage = Triage::from_config(&config).unwrap();
        assert_eq!(triage.knowledge_base().len(), 1);
        assert_eq!(triage.search_limit(), 2);
    }

    #[test]
    fn test_from_config_missing_knowledge_base_fails() {
        let mut config = Config::default();
        config.matcher.knowledge_base = Some("/nonexistent/kb.toml".into());
        assert!(Triage::from_config(&config).is_err());
    }
}
