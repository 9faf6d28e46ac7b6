//! Routing translator with identity fallback.
//!
//! The secondary language goes to the public endpoint first. Everything
//! else, and any public endpoint failure, goes to the capability
//! translator. If that fails too the input comes back unchanged.

use tracing::warn;

use crate::core::language::Language;
use crate::translate::traits::Translator;

/// Total translator over an optional public endpoint and a fallback.
pub struct RoutedTranslator {
    /// Tried first for the secondary language.
    public: Option<Box<dyn Translator>>,
    /// Used for other targets and when the public endpoint fails.
    fallback: Box<dyn Translator>,
}

impl RoutedTranslator {
    pub fn new(public: Option<Box<dyn Translator>>, fallback: Box<dyn Translator>) -> Self {
        Self { public, fallback }
    }

    /// Translate `text` into `target`. Never fails.
    pub fn translate(&self, text: &str, target: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        if target == Language::Secondary.code() {
            if let Some(public) = &self.public {
                match public.translate(text, target) {
                    Ok(translated) => return translated,
                    Err(e) => warn!(
                        "translator '{}' failed: {}, falling back to '{}'",
                        public.name(),
                        e,
                        self.fallback.name()
                    ),
                }
            }
        }

        match self.fallback.translate(text, target) {
            Ok(translated) => translated,
            Err(e) => {
                warn!(
                    "translator '{}' failed: {} (returning input unchanged)",
                    self.fallback.name(),
                    e
                );
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TriageError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        reply: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn boxed(reply: Option<&'static str>) -> (Box<dyn Translator>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let translator = Fixed {
                reply,
                calls: calls.clone(),
            };
            (Box::new(translator), calls)
        }
    }

    impl Translator for Fixed {
        fn translate(&self, _text: &str, _target: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(|s| s.to_string())
                .ok_or_else(|| TriageError::capability("translator down"))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_secondary_target_prefers_public() {
        let (public, public_calls) = Fixed::boxed(Some("Сәлем"));
        let (fallback, fallback_calls) = Fixed::boxed(Some("llm"));
        let router = RoutedTranslator::new(Some(public), fallback);

        assert_eq!(router.translate("Привет", "kk"), "Сәлем");
        assert_eq!(public_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_public_failure_falls_back() {
        let (public, _) = Fixed::boxed(None);
        let (fallback, _) = Fixed::boxed(Some("llm"));
        let router = RoutedTranslator::new(Some(public), fallback);

        assert_eq!(router.translate("Привет", "kk"), "llm");
    }

    #[test]
    fn test_other_targets_skip_public() {
        let (public, public_calls) = Fixed::boxed(Some("public"));
        let (fallback, _) = Fixed::boxed(Some("Hello"));
        let router = RoutedTranslator::new(Some(public), fallback);

        assert_eq!(router.translate("Привет", "en"), "Hello");
        assert_eq!(public_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_failures_return_input() {
        let (public, _) = Fixed::boxed(None);
        let (fallback, _) = Fixed::boxed(None);
        let router = RoutedTranslator::new(Some(public), fallback);

        assert_eq!(router.translate("Привет", "kk"), "Привет");
        assert_eq!(router.translate("Привет", "en"), "Привет");
    }

    #[test]
    fn test_blank_text_untouched() {
        let (fallback, calls) = Fixed::boxed(Some("x"));
        let router = RoutedTranslator::new(None, fallback);
        assert_eq!(router.translate("  ", "en"), "  ");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
