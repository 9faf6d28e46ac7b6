//! Response confidence evaluation and the auto-close gate.
//!
//! A candidate answer is judged by six signals extracted by the generative
//! capability. The numeric confidence is shaped by those signals, and the
//! decision to close a ticket without an operator is a conjunction: one
//! failed quality signal forces human handoff whatever the number says.
//!
//! `AutoCloseGate::permits` is the only place that can say yes.

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::matcher::tokenize;
use crate::error::{Result, TriageError};

/// Confidence must be strictly above this to auto-close.
pub const AUTO_CLOSE_THRESHOLD: f64 = 0.8;

/// Reported confidence never exceeds this.
pub const CONFIDENCE_CEILING: f64 = 0.95;

/// Raw confidence used when the capability did not report one.
pub const DEFAULT_RAW_CONFIDENCE: f64 = 0.5;

/// Cap applied when the answer is irrelevant or inaccurate.
pub const UNTRUSTED_CAP: f64 = 0.5;

/// Cap applied when any gate signal fails.
pub const PARTIAL_CAP: f64 = 0.6;

/// Floor applied when every gate signal passes.
pub const QUALIFIED_FLOOR: f64 = 0.8;

/// Minimum answer length (chars) for the lexical relevance re-check.
pub const MIN_RELEVANT_ANSWER_CHARS: usize = 30;

fn yes() -> bool {
    true
}

fn null_as_yes<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn null_as_no<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Quality signals for one question/answer pair.
///
/// Deserializes from the capability's JSON verdict. Missing relevance,
/// accuracy and completeness default to true; missing `needsMoreInfo` and
/// `canAutoClose` default to false, so an empty verdict can never close a
/// ticket. A `null` field takes the same default as a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceSignals {
    #[serde(default = "yes", deserialize_with = "null_as_yes")]
    pub is_relevant: bool,
    #[serde(default = "yes", deserialize_with = "null_as_yes")]
    pub is_accurate: bool,
    #[serde(default = "yes", deserialize_with = "null_as_yes")]
    pub is_complete: bool,
    #[serde(default, deserialize_with = "null_as_no")]
    pub needs_more_info: bool,
    #[serde(default, deserialize_with = "null_as_no")]
    pub can_auto_close: bool,
    /// Diagnostic only.
    #[serde(default)]
    pub is_simple: Option<bool>,
    #[serde(default, rename = "confidence")]
    pub raw_confidence: Option<f64>,
}

impl Default for ConfidenceSignals {
    fn default() -> Self {
        Self {
            is_relevant: true,
            is_accurate: true,
            is_complete: true,
            needs_more_info: false,
            can_auto_close: false,
            is_simple: None,
            raw_confidence: None,
        }
    }
}

impl ConfidenceSignals {
    /// Signals with every gate condition satisfied.
    pub fn all_clear(raw_confidence: f64) -> Self {
        Self {
            can_auto_close: true,
            raw_confidence: Some(raw_confidence),
            ..Default::default()
        }
    }

    /// Parse the capability's structured verdict.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(TriageError::signal_parse(format!(
                "expected a JSON object, got {}",
                value
            )));
        }
        serde_json::from_value(value).map_err(|e| TriageError::signal_parse(e.to_string()))
    }

    /// Whether every quality signal required by the gate holds.
    pub fn gate_passes(&self) -> bool {
        self.is_relevant
            && self.is_accurate
            && self.is_complete
            && self.can_auto_close
            && !self.needs_more_info
    }

    /// Raw confidence clamped to [0, 1], defaulting when absent or NaN.
    fn raw(&self) -> f64 {
        match self.raw_confidence {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => DEFAULT_RAW_CONFIDENCE,
        }
    }
}

/// The auto-close decision rule.
pub struct AutoCloseGate;

impl AutoCloseGate {
    /// Decide whether a ticket may close without an operator.
    pub fn permits(confidence: f64, signals: &ConfidenceSignals) -> bool {
        confidence > AUTO_CLOSE_THRESHOLD && signals.gate_passes()
    }
}

/// Outcome of evaluating one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    confidence: f64,
    should_auto_close: bool,
}

impl Evaluation {
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Only `evaluate` can set this, through `AutoCloseGate`.
    pub fn should_auto_close(&self) -> bool {
        self.should_auto_close
    }

    /// An evaluation that hands the ticket to an operator.
    pub fn deferred(confidence: f64) -> Self {
        Self {
            confidence: confidence.clamp(0.0, CONFIDENCE_CEILING),
            should_auto_close: false,
        }
    }

    /// Cap confidence and withdraw auto-close after a failed re-check.
    pub fn demote(self, cap: f64) -> Self {
        Self::deferred(self.confidence.min(cap))
    }
}

/// Score an answer from its quality signals.
pub fn evaluate(_question: &str, _answer: &str, signals: &ConfidenceSignals) -> Evaluation {
    let mut confidence = signals.raw();

    if !signals.is_relevant || !signals.is_accurate {
        confidence = confidence.min(UNTRUSTED_CAP);
    }

    if signals.gate_passes() {
        confidence = confidence.max(QUALIFIED_FLOOR);
    } else {
        confidence = confidence.min(PARTIAL_CAP);
    }

    confidence = confidence.min(CONFIDENCE_CEILING);

    Evaluation {
        confidence,
        should_auto_close: AutoCloseGate::permits(confidence, signals),
    }
}

/// Phrases showing the answer itself hedges or redirects.
const UNCERTAINTY_PHRASES: &[&str] = &[
    "не уверен",
    "обратитесь",
    "специалист",
    "уточните",
    "дополнительная информация",
];

/// Words that mark a question as urgent.
const URGENCY_WORDS: &[&str] = &["срочно", "критично"];

/// Confidence for a simple question when signals are unavailable.
pub const HEURISTIC_SIMPLE_CONFIDENCE: f64 = 0.65;

/// Confidence for anything else when signals are unavailable.
pub const HEURISTIC_OTHER_CONFIDENCE: f64 = 0.4;

/// Fallback evaluation when signal extraction fails. Never auto-closes.
pub fn heuristic_evaluation(question: &str, answer: &str) -> Evaluation {
    let answer_lower = answer.to_lowercase();
    let question_lower = question.to_lowercase();

    let hedges = UNCERTAINTY_PHRASES
        .iter()
        .any(|p| answer_lower.contains(p));
    let urgent = URGENCY_WORDS.iter().any(|w| question_lower.contains(w));

    let simple = question.chars().count() < 200
        && !urgent
        && answer.chars().count() > 50
        && !hedges;

    Evaluation::deferred(if simple {
        HEURISTIC_SIMPLE_CONFIDENCE
    } else {
        HEURISTIC_OTHER_CONFIDENCE
    })
}

/// Lexical re-check that an answer talks about the question.
///
/// The answer must be longer than `MIN_RELEVANT_ANSWER_CHARS` and mention
/// the question's first word or any of its longer words.
pub fn answer_mentions_question(question: &str, answer: &str) -> bool {
    let answer_lower = answer.to_lowercase();
    if answer_lower.chars().count() <= MIN_RELEVANT_ANSWER_CHARS {
        return false;
    }

    let question_lower = question.to_lowercase();
    let first_word = question_lower
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty());

    if let Some(word) = first_word {
        if answer_lower.contains(word) {
            return true;
        }
    }

    tokenize(&question_lower)
        .iter()
        .any(|w| answer_lower.contains(w.as_str()))
}
