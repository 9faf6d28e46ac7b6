//! Ticket classification.
//!
//! Asks the capability for a JSON verdict constrained to the department
//! directory. Any capability failure falls back to fixed keyword rules.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{complete_json, Completion, CompletionRequest};
use crate::core::department;
use crate::error::{FailSafe, Result, TriageError};

/// Confidence reported by the keyword fallback.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

/// Confidence assumed when the capability omits one.
pub const DEFAULT_CAPABILITY_CONFIDENCE: f64 = 0.7;

/// Category label when no rule matches.
pub const GENERAL_CATEGORY: &str = "Общий вопрос";

const CLASSIFY_SYSTEM_PROMPT: &str =
    "Ты помощник для классификации заявок. Отвечай только валидным JSON без дополнительного текста.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    #[default]
    Question,
    Issue,
    Request,
    Complaint,
    Feedback,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Question => "question",
            TicketType::Issue => "issue",
            TicketType::Request => "request",
            TicketType::Complaint => "complaint",
            TicketType::Feedback => "feedback",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "question" => Some(TicketType::Question),
            "issue" => Some(TicketType::Issue),
            "request" => Some(TicketType::Request),
            "complaint" => Some(TicketType::Complaint),
            "feedback" => Some(TicketType::Feedback),
            _ => None,
        }
    }
}

/// Routing verdict for a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Short free-text description of the problem.
    pub category: String,
    pub priority: Priority,
    pub ticket_type: TicketType,
    pub department_id: String,
    pub department_name: String,
    pub confidence: f64,
}

/// Department keyword rules, checked in order.
struct DepartmentRule {
    department_id: &'static str,
    category: &'static str,
    ticket_type: TicketType,
    keywords: &'static [&'static str],
}

const DEPARTMENT_RULES: &[DepartmentRule] = &[
    DepartmentRule {
        department_id: "tech",
        category: "Техническая проблема",
        ticket_type: TicketType::Issue,
        keywords: &["пароль", "войти", "логин", "не работает", "ошибка", "баг"],
    },
    DepartmentRule {
        department_id: "sales",
        category: "Вопрос о продажах",
        ticket_type: TicketType::Question,
        keywords: &["купить", "цена", "заказ", "товар", "продаж"],
    },
    DepartmentRule {
        department_id: "billing",
        category: "Финансовый вопрос",
        ticket_type: TicketType::Request,
        keywords: &["оплата", "счет", "деньги", "возврат", "refund"],
    },
    DepartmentRule {
        department_id: "hr",
        category: "HR вопрос",
        ticket_type: TicketType::Question,
        keywords: &["отпуск", "документ", "кадр"],
    },
];

const URGENT_WORDS: &[&str] = &["срочно", "urgent", "критично"];
const HIGH_WORDS: &[&str] = &["важно", "important"];
const LOW_WORDS: &[&str] = &["неважно", "когда будет время"];

/// Keyword-based priority. High is checked before low, so "неважно"
/// (which contains "важно") is high.
pub fn keyword_priority(text_lower: &str) -> Priority {
    let hit = |words: &[&str]| words.iter().any(|w| text_lower.contains(w));

    if hit(URGENT_WORDS) {
        Priority::Urgent
    } else if hit(HIGH_WORDS) {
        Priority::High
    } else if hit(LOW_WORDS) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Deterministic classification from keyword rules.
pub fn fallback_classification(text: &str) -> Classification {
    let lower = text.to_lowercase();

    let rule = DEPARTMENT_RULES
        .iter()
        .find(|r| r.keywords.iter().any(|k| lower.contains(k)));

    let (department_id, category, ticket_type) = match rule {
        Some(r) => (r.department_id, r.category, r.ticket_type),
        None => (
            department::FALLBACK_DEPARTMENT_ID,
            GENERAL_CATEGORY,
            TicketType::Question,
        ),
    };
    let dept = department::resolve(department_id);

    Classification {
        category: category.to_string(),
        priority: keyword_priority(&lower),
        ticket_type,
        department_id: dept.id.to_string(),
        department_name: dept.name.to_string(),
        confidence: FALLBACK_CONFIDENCE,
    }
}

fn classification_prompt(text: &str) -> String {
    format!(
        "Проанализируй следующую заявку пользователя и определи:\n\
         1. Категорию (краткое описание проблемы)\n\
         2. Приоритет (low, medium, high, urgent)\n\
         3. Тип (question, issue, request, complaint, feedback)\n\
         4. Отдел из списка: {}\n\n\
         Заявка: \"{}\"\n\n\
         Ответь в формате JSON:\n\
         {{\n  \"category\": \"краткое описание\",\n  \"priority\": \"low|medium|high|urgent\",\n  \
         \"type\": \"question|issue|request|complaint|feedback\",\n  \"departmentId\": \"id отдела\",\n  \
         \"confidence\": 0.0-1.0\n}}",
        department::prompt_listing(),
        text
    )
}

/// Interpret the capability's JSON verdict.
///
/// Unknown departments become `general`, unknown priority and type take
/// their defaults, and a missing or zero confidence becomes 0.7.
pub fn parse_classification(value: &serde_json::Value) -> Result<Classification> {
    let obj = value
        .as_object()
        .ok_or_else(|| TriageError::capability("classification reply is not a JSON object"))?;

    let text_field = |key: &str| obj.get(key).and_then(|v| v.as_str()).unwrap_or("");

    let dept = department::resolve(text_field("departmentId"));
    let category = match text_field("category").trim() {
        "" => GENERAL_CATEGORY.to_string(),
        c => c.to_string(),
    };
    let confidence = match obj.get("confidence").and_then(|v| v.as_f64()) {
        Some(c) if c.is_finite() && c > 0.0 => c.min(1.0),
        _ => DEFAULT_CAPABILITY_CONFIDENCE,
    };

    Ok(Classification {
        category,
        priority: Priority::from_str_opt(text_field("priority")).unwrap_or_default(),
        ticket_type: TicketType::from_str_opt(text_field("type")).unwrap_or_default(),
        department_id: dept.id.to_string(),
        department_name: dept.name.to_string(),
        confidence,
    })
}

fn classify_with_capability(capability: &dyn Completion, text: &str) -> Result<Classification> {
    let request = CompletionRequest::new(CLASSIFY_SYSTEM_PROMPT, classification_prompt(text))
        .temperature(0.3)
        .structured();
    let value = complete_json(capability, &request)?;
    parse_classification(&value)
}

/// Classify ticket text. Total: capability failures use the keyword rules.
pub fn classify(capability: &dyn Completion, text: &str) -> Classification {
    let result = if capability.is_available() {
        classify_with_capability(capability, text)
    } else {
        Err(TriageError::CapabilityUnavailable)
    };

    let classification = match result {
        Err(TriageError::CapabilityUnavailable) => fallback_classification(text),
        other => other.fail_safe_with("ticket classification", fallback_classification(text)),
    };

    debug!(
        department = %classification.department_id,
        priority = classification.priority.as_str(),
        confidence = classification.confidence,
        "classified ticket"
    );

    classification
}
