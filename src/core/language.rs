//! Heuristic language detection.
//!
//! Tickets arrive in one of two languages. The secondary language (Kazakh)
//! is recognised by marker substrings: its extra Cyrillic letters and a
//! handful of common function words. Everything else is treated as the
//! primary language (Russian).

use serde::{Deserialize, Serialize};

/// Number of distinct markers needed to classify text as secondary.
pub const SECONDARY_MARKER_THRESHOLD: usize = 2;

/// Marker substrings for the secondary language.
///
/// Matched with plain substring containment on lower-cased input, so short
/// words such as "не" or "мен" also fire inside longer words.
pub const SECONDARY_MARKERS: &[&str] = &[
    "ә", "ғ", "қ", "ң", "ө", "ұ", "ү", "һ", "і", "қалай", "не", "қайда", "қашан", "керек",
    "болады", "емес", "жоқ", "бар", "біз", "сіз", "олар", "мен", "сен", "біздің", "сіздің",
    "олардың",
];

/// Supported natural languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// Russian.
    #[default]
    #[serde(rename = "ru")]
    Primary,
    /// Kazakh.
    #[serde(rename = "kk")]
    Secondary,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Primary => "ru",
            Language::Secondary => "kk",
        }
    }

    /// Language name as used inside generation prompts.
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Language::Primary => "русский",
            Language::Secondary => "казахский",
        }
    }

    /// Parse an ISO code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "ru" => Some(Language::Primary),
            "kk" => Some(Language::Secondary),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Count how many secondary markers occur in the text.
pub fn secondary_marker_count(text: &str) -> usize {
    let lower = text.to_lowercase();
    SECONDARY_MARKERS
        .iter()
        .filter(|marker| lower.contains(*marker))
        .count()
}

/// Detect the language of a text.
pub fn detect(text: &str) -> Language {
    if secondary_marker_count(text) >= SECONDARY_MARKER_THRESHOLD {
        Language::Secondary
    } else {
        Language::Primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_primary() {
        assert_eq!(detect(""), Language::Primary);
    }

    #[test]
    fn test_russian_question_is_primary() {
        assert_eq!(detect("Как сбросить пароль?"), Language::Primary);
    }

    #[test]
    fn test_kazakh_question_is_secondary() {
        assert_eq!(detect("Құпия сөзді қалай өзгертуге болады?"), Language::Secondary);
    }

    #[test]
    fn test_single_marker_is_primary() {
        // Only "не" fires.
        assert_eq!(secondary_marker_count("Сайт не работает"), 1);
        assert_eq!(detect("Сайт не работает"), Language::Primary);
    }

    #[test]
    fn test_substring_overcounting_is_preserved() {
        // "қалай" also contains "қ"; both count.
        assert_eq!(secondary_marker_count("қалай"), 2);
        assert_eq!(detect("қалай"), Language::Secondary);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(detect("ҚАЛАЙ"), Language::Secondary);
    }

    #[test]
    fn test_russian_can_false_positive() {
        // "не" and "мен" (inside "изменить") push ordinary Russian over the line.
        assert_eq!(detect("Не могу изменить email"), Language::Secondary);
    }

    #[test]
    fn test_codes() {
        assert_eq!(Language::Primary.code(), "ru");
        assert_eq!(Language::Secondary.code(), "kk");
        assert_eq!(Language::from_code("KK"), Some(Language::Secondary));
        assert_eq!(Language::from_code("en"), None);
    }

    #[test]
    fn test_serde_codes() {
        let json = serde_json::to_string(&Language::Secondary).unwrap();
        assert_eq!(json, "\"kk\"");
        let parsed: Language = serde_json::from_str("\"ru\"").unwrap();
        assert_eq!(parsed, Language::Primary);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_detect_is_deterministic(text in ".{0,80}") {
                prop_assert_eq!(detect(&text), detect(&text));
            }

            #[test]
            fn prop_ascii_is_primary(text in "[a-zA-Z0-9 ?!.,]{0,80}") {
                prop_assert_eq!(detect(&text), Language::Primary);
            }
        }
    }
}
