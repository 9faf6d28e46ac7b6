//! Triage - helpdesk FAQ relevance scoring and auto-response gating
//!
//! Triage classifies incoming support requests, matches them against a
//! static knowledge base, and decides whether a generated answer is safe to
//! send and close without an operator. Every operation is total: when the
//! generative capability is missing or fails, deterministic fallbacks keep
//! tickets open for a human.

pub mod capability;
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod tickets;
pub mod translate;

pub use capability::{ChatCompletionClient, Completion, CompletionRequest, Generation, Unconfigured};
pub use config::Config;
pub use core::{
    AutoCloseGate, Classification, ConfidenceSignals, Department, Evaluation, KnowledgeBase,
    KnowledgeEntry, Language, MatchCandidate, Outcome, Priority, ResolutionContext,
    ResolutionDecision, Resolver, TicketType,
};
pub use engine::Triage;
pub use error::{FailSafe, Result, TriageError};
pub use tickets::{
    FileTicketStore, MemoryTicketStore, NewTicket, Ticket, TicketService, TicketStatus,
    TicketStore,
};
pub use translate::{RoutedTranslator, Translator};

// CLI commands
pub use cli::{
    ClassifyCommand, DetectCommand, ResolveCommand, SearchCommand, TicketsCommand,
    TranslateCommand,
};

/// Classify ticket text for routing. Never fails.
pub fn classify_ticket(capability: &dyn Completion, text: &str) -> Classification {
    core::classify(capability, text)
}

/// Try to answer a question without an operator. Never fails.
pub fn resolve_automatically(
    capability: &dyn Completion,
    kb: &KnowledgeBase,
    question: &str,
    context: Option<&ResolutionContext>,
) -> ResolutionDecision {
    core::resolver::resolve(capability, kb, question, context)
}

/// Knowledge entries relevant to a query, best first.
pub fn search_knowledge_base(kb: &KnowledgeBase, query: &str, limit: usize) -> Vec<KnowledgeEntry> {
    core::search(kb, query, limit)
}
