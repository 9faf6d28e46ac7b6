//! Operator assistance: reply suggestions and conversation summaries.
//!
//! Both operations are total. Without a capability they return canned text.

use tracing::debug;

use crate::capability::{Completion, CompletionRequest};
use crate::error::FailSafe;

/// History entries included in the suggestion prompt.
pub const HISTORY_WINDOW: usize = 8;

/// Suggestion lines this short are dropped.
const MIN_SUGGESTION_CHARS: usize = 10;

/// Characters of the first message kept in the offline summary.
const SUMMARY_PREVIEW_CHARS: usize = 100;

const CANNED_REPLIES: [&str; 3] = [
    "Спасибо за обращение. Мы рассмотрим вашу заявку в ближайшее время.",
    "Понял вашу проблему. Давайте решим это вместе.",
    "Благодарим за обращение. Наш специалист свяжется с вами.",
];

const NO_MESSAGES_SUMMARY: &str = "Нет сообщений для резюмирования.";
const EMPTY_SUMMARY: &str = "Не удалось создать резюме.";

const SUGGEST_SYSTEM_PROMPT: &str = "Ты опытный оператор службы поддержки с отличными навыками \
     общения. Генерируй профессиональные, вежливые и эффективные ответы, которые помогают решить \
     проблему клиента.";
const SUMMARY_SYSTEM_PROMPT: &str =
    "Ты помощник для создания резюме переписки. Создавай краткие и информативные резюме.";

/// Ticket details shown to the model when suggesting replies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketContext {
    pub title: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub ticket_type: Option<String>,
    pub department: Option<String>,
}

impl TicketContext {
    fn prompt_block(&self) -> String {
        let show = |v: &Option<String>, missing: &'static str| -> String {
            v.clone().unwrap_or_else(|| missing.to_string())
        };
        format!(
            "\n\nКонтекст тикета:\n- Тема: {}\n- Категория: {}\n- Приоритет: {}\n- Тип: {}\n- Отдел: {}",
            show(&self.title, "Не указана"),
            show(&self.category, "Не указана"),
            show(&self.priority, "Не указан"),
            show(&self.ticket_type, "Не указан"),
            show(&self.department, "Не указан"),
        )
    }
}

fn is_numbered(line: &str) -> bool {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && matches!(line[digits..].chars().next(), Some('.') | Some(')'))
}

fn is_bulleted(line: &str) -> bool {
    line.starts_with(['-', '•', '*'])
}

/// Keep reply lines that look like standalone suggestions.
pub fn filter_suggestions(text: &str, count: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            line.chars().count() > MIN_SUGGESTION_CHARS
                && !is_numbered(line)
                && !is_bulleted(line)
                && !lower.contains("вариант")
                && !lower.contains("ответ")
        })
        .take(count)
        .map(str::to_string)
        .collect()
}

fn suggestion_prompt(
    description: &str,
    history: &[String],
    count: usize,
    context: Option<&TicketContext>,
) -> String {
    let context_block = context.map(|c| c.prompt_block()).unwrap_or_default();
    let history_block = if history.is_empty() {
        String::new()
    } else {
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        format!("\n\nИстория переписки:\n{}", history[start..].join("\n\n"))
    };

    format!(
        "Ты опытный оператор службы поддержки. Проанализируй ситуацию и предложи {count} варианта \
         профессиональных ответов.\n\n\
         Исходная заявка: \"{description}\"{context_block}{history_block}\n\n\
         Требования к ответам:\n\
         1. Учитывай контекст и историю переписки\n\
         2. Будь вежливым, профессиональным и понятным\n\
         3. Для срочных вопросов - более оперативный тон\n\
         4. Для технических проблем - предложи конкретные шаги\n\
         5. Для вопросов - дай развернутый ответ\n\
         6. Каждый ответ должен быть уникальным по подходу\n\n\
         Сгенерируй {count} варианта ответов на русском языке.\n\
         Формат: просто список ответов, каждый с новой строки, без нумерации и маркеров."
    )
}

/// Suggest replies an operator could send.
///
/// Returns at most `count` lines. An unconfigured capability gives the three
/// canned replies; a failing or empty one gives the first canned reply.
pub fn suggest_replies(
    capability: &dyn Completion,
    description: &str,
    history: &[String],
    count: usize,
    context: Option<&TicketContext>,
) -> Vec<String> {
    if !capability.is_available() {
        return CANNED_REPLIES.iter().map(|s| s.to_string()).collect();
    }

    let request = CompletionRequest::new(
        SUGGEST_SYSTEM_PROMPT,
        suggestion_prompt(description, history, count, context),
    )
    .temperature(0.7)
    .max_tokens(800);

    let suggestions = capability
        .complete(&request)
        .map(|text| filter_suggestions(&text, count))
        .fail_safe_default("reply suggestions");

    debug!(count = suggestions.len(), "suggested replies");

    if suggestions.is_empty() {
        vec![CANNED_REPLIES[0].to_string()]
    } else {
        suggestions
    }
}

/// Summarize a conversation for an operator.
pub fn summarize(capability: &dyn Completion, messages: &[String]) -> String {
    if messages.is_empty() {
        return NO_MESSAGES_SUMMARY.to_string();
    }

    if !capability.is_available() {
        let preview: String = messages[0].chars().take(SUMMARY_PREVIEW_CHARS).collect();
        return format!(
            "Переписка содержит {} сообщений. Основная тема: {}...",
            messages.len(),
            preview
        );
    }

    let prompt = format!(
        "Резюмируй следующую переписку с клиентом. Выдели основные моменты, проблемы и решения.\n\n\
         Переписка:\n{}\n\nРезюме (краткое, на русском языке):",
        messages.join("\n\n")
    );
    let request = CompletionRequest::new(SUMMARY_SYSTEM_PROMPT, prompt)
        .temperature(0.5)
        .max_tokens(300);

    let count_only = format!("Переписка содержит {} сообщений.", messages.len());
    capability
        .complete(&request)
        .map(|text| match text.trim() {
            "" => EMPTY_SUMMARY.to_string(),
            trimmed => trimmed.to_string(),
        })
        .fail_safe_with("conversation summary", count_only)
}
