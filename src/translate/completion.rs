//! Translation through the generative capability.

use std::sync::Arc;

use crate::capability::{Completion, CompletionRequest};
use crate::error::{Result, TriageError};
use crate::translate::traits::{language_name, Translator};

const TRANSLATE_SYSTEM_PROMPT: &str =
    "Ты профессиональный переводчик. Переводи точно, сохраняя смысл и стиль.";

/// Translator that prompts the capability.
pub struct CompletionTranslator {
    capability: Arc<dyn Completion>,
}

impl CompletionTranslator {
    pub fn new(capability: Arc<dyn Completion>) -> Self {
        Self { capability }
    }
}

impl Translator for CompletionTranslator {
    fn translate(&self, text: &str, target: &str) -> Result<String> {
        let prompt = format!(
            "Переведи следующий текст на {} язык. Сохрани стиль и тон оригинала.\n\n\
             Текст: \"{}\"\n\nПеревод:",
            language_name(target),
            text
        );
        let request = CompletionRequest::new(TRANSLATE_SYSTEM_PROMPT, prompt)
            .temperature(0.3)
            .max_tokens(500);

        let reply = self.capability.complete(&request)?;
        match reply.trim() {
            "" => Err(TriageError::capability("empty translation")),
            translated => Ok(translated.to_string()),
        }
    }

    fn name(&self) -> &'static str {
        "completion"
    }
}
