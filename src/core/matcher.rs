//! Knowledge base relevance scoring.
//!
//! Scores a free-text query against every knowledge entry by summing named
//! bonuses, keeps entries at or above the relevance floor, and ranks them.
//!
//! Scoring weights:
//! - Entry language matches query language: 3
//! - Question contains the whole query, or query contains the question's first word: 20
//! - Each shared question word (longer than 3 chars): 5
//! - Each entry keyword (longer than 3 chars) found in the query: 5
//! - Answer contains the whole query: 2
//!
//! Without at least one shared word or keyword hit the score is 0, whatever
//! else matched. Scores are combined via sum (not max).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::knowledge::{KnowledgeBase, KnowledgeEntry};
use crate::core::language::{detect, Language};

/// Score weights for knowledge base matching.
///
/// Empirical values; keep them in sync with `RELEVANCE_FLOOR`.
pub mod weights {
    /// Entry language equals the detected query language.
    pub const LANGUAGE_MATCH: u32 = 3;
    /// Whole-query containment in the question, or first question word in the query.
    pub const QUESTION_MATCH: u32 = 20;
    /// Per shared question token.
    pub const TOKEN_OVERLAP: u32 = 5;
    /// Per keyword found in the query.
    pub const KEYWORD_MATCH: u32 = 5;
    /// Whole-query containment in the answer.
    pub const ANSWER_MATCH: u32 = 2;
}

/// Minimum score for an entry to be returned.
pub const RELEVANCE_FLOOR: u32 = 8;

/// Tokens and keywords must be longer than this many characters.
pub const MIN_WORD_CHARS: usize = 3;

/// Off-topic phrases that never get an automatic answer.
pub const DENY_LIST: &[&str] = &[
    "смысл жизни",
    "в чем смысл",
    "в чём смысл",
    "что такое любовь",
    "что такое счастье",
    "существует ли бог",
    "бог существует",
    "что будет после смерти",
    "кто ты такой",
    "расскажи анекдот",
    "расскажи шутку",
    "как дела",
    "философ",
    "өмірдің мәні",
];

/// A knowledge entry with its computed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub entry: KnowledgeEntry,
    pub score: u32,
}

impl MatchCandidate {
    pub fn new(entry: KnowledgeEntry, score: u32) -> Self {
        Self { entry, score }
    }
}

/// Split lower-cased text into words longer than `MIN_WORD_CHARS`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > MIN_WORD_CHARS)
        .map(|w| w.to_string())
        .collect()
}

/// Whether the query hits the off-topic deny-list.
pub fn is_off_topic(query: &str) -> bool {
    let lower = query.to_lowercase();
    DENY_LIST.iter().any(|phrase| lower.contains(phrase))
}

/// First word of a question, lower-cased, without surrounding punctuation.
fn first_question_word(question_lower: &str) -> Option<&str> {
    question_lower
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}

/// Score one entry against a query in the given language.
pub fn score(query: &str, language: Language, entry: &KnowledgeEntry) -> u32 {
    let query_lower = query.trim().to_lowercase();
    let question_lower = entry.question.to_lowercase();
    let answer_lower = entry.answer.to_lowercase();

    let mut total = 0u32;

    if entry.language == language {
        total += weights::LANGUAGE_MATCH;
    }

    let first_word_hit = first_question_word(&question_lower)
        .map(|w| query_lower.contains(w))
        .unwrap_or(false);
    if question_lower.contains(&query_lower) || first_word_hit {
        total += weights::QUESTION_MATCH;
    }

    let question_tokens = tokenize(&question_lower);
    let overlap = tokenize(&query_lower)
        .iter()
        .filter(|t| question_tokens.contains(t))
        .count() as u32;
    total += weights::TOKEN_OVERLAP * overlap;

    let keyword_hits = entry
        .keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|k| k.chars().count() > MIN_WORD_CHARS && query_lower.contains(k.as_str()))
        .count() as u32;
    total += weights::KEYWORD_MATCH * keyword_hits;

    if answer_lower.contains(&query_lower) {
        total += weights::ANSWER_MATCH;
    }

    if overlap == 0 && keyword_hits == 0 {
        return 0;
    }

    total
}

/// Rank knowledge entries for a query, best first.
///
/// Entries below `RELEVANCE_FLOOR` are dropped. Ties keep knowledge base
/// order.
pub fn rank(kb: &KnowledgeBase, query: &str, limit: usize) -> Vec<MatchCandidate> {
    if is_off_topic(query) {
        debug!("query rejected by off-topic deny-list");
        return Vec::new();
    }

    let language = detect(query);

    let mut scored: Vec<MatchCandidate> = kb
        .entries()
        .iter()
        .filter_map(|entry| {
            let s = score(query, language, entry);
            debug!(entry_id = %entry.id, score = s, "scored knowledge entry");
            (s >= RELEVANCE_FLOOR).then(|| MatchCandidate::new(entry.clone(), s))
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);

    scored
}

/// Search the knowledge base, returning the matching entries best first.
pub fn search(kb: &KnowledgeBase, query: &str, limit: usize) -> Vec<KnowledgeEntry> {
    rank(kb, query, limit)
        .into_iter()
        .map(|c| c.entry)
        .collect()
}
