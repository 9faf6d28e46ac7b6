//! Core triage logic.
//!
//! Language detection, knowledge base matching, confidence gating,
//! classification, auto-resolution and operator assistance.

pub mod assist;
pub mod classifier;
pub mod confidence;
pub mod department;
pub mod knowledge;
pub mod language;
pub mod matcher;
pub mod resolver;

pub use assist::{suggest_replies, summarize, TicketContext};
pub use classifier::{classify, fallback_classification, Classification, Priority, TicketType};
pub use confidence::{
    evaluate, heuristic_evaluation, AutoCloseGate, ConfidenceSignals, Evaluation,
    AUTO_CLOSE_THRESHOLD, CONFIDENCE_CEILING,
};
pub use department::Department;
pub use knowledge::{Category, KnowledgeBase, KnowledgeEntry};
pub use language::{detect, Language};
pub use matcher::{rank, search, weights, MatchCandidate, RELEVANCE_FLOOR};
pub use resolver::{Outcome, ResolutionContext, ResolutionDecision, Resolver};
