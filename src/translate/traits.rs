//! Translator trait.

use crate::error::Result;

/// Trait for text translators.
///
/// Implementations return an error on any failure; callers that need a
/// total operation go through `RoutedTranslator`.
pub trait Translator: Send + Sync {
    /// Translate `text` into the language with code `target` (e.g. "kk").
    fn translate(&self, text: &str, target: &str) -> Result<String>;

    /// Translator name for logging.
    fn name(&self) -> &'static str;
}

/// Blanket implementation for boxed trait objects.
impl Translator for Box<dyn Translator> {
    fn translate(&self, text: &str, target: &str) -> Result<String> {
        (**self).translate(text, target)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Human-readable language name used in translation prompts.
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "английский",
        "ru" => "русский",
        "kk" => "казахский",
        "es" => "испанский",
        "fr" => "французский",
        "de" => "немецкий",
        "zh" => "китайский",
        other => other,
    }
}
