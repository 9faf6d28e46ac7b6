//! Ticket data model.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::classifier::{Classification, Priority, TicketType};

static TICKET_COUNTER: AtomicU64 = AtomicU64::new(0);
static MESSAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Sender name used for automatic answers.
pub const AI_SENDER_NAME: &str = "AI Помощник";

/// Default display name for users who gave none.
pub const DEFAULT_USER_NAME: &str = "Пользователь";

/// Default email for users who gave none.
pub const DEFAULT_USER_EMAIL: &str = "user@example.com";

/// Reason recorded when a ticket is moved to another department.
pub const REROUTE_REASON: &str = "Тикет был перенаправлен в другой отдел";

/// Generate a unique ticket ID: `ticket-{millis}-{counter}`.
pub fn generate_ticket_id() -> String {
    let counter = TICKET_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("ticket-{}-{:04}", Utc::now().timestamp_millis(), counter % 10_000)
}

/// Generate a unique message ID: `msg-{millis}-{counter}`.
pub fn generate_message_id() -> String {
    let counter = MESSAGE_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("msg-{}-{:04}", Utc::now().timestamp_millis(), counter % 10_000)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Resolved or closed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(TicketStatus::Open),
            "in_progress" | "in-progress" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Operator,
    Ai,
}

impl Sender {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Sender::User),
            "operator" => Some(Sender::Operator),
            "ai" => Some(Sender::Ai),
            _ => None,
        }
    }
}

/// One message in a ticket conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: String,
    pub ticket_id: String,
    pub content: String,
    pub sender: Sender,
    pub sender_name: String,
    pub created_at: DateTime<Utc>,
    /// Translations keyed by language code.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub translated_content: BTreeMap<String, String>,
}

impl TicketMessage {
    pub fn new(
        ticket_id: impl Into<String>,
        content: impl Into<String>,
        sender: Sender,
        sender_name: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_message_id(),
            ticket_id: ticket_id.into(),
            content: content.into(),
            sender,
            sender_name: sender_name.into(),
            created_at: Utc::now(),
            translated_content: BTreeMap::new(),
        }
    }
}

/// Record of a ticket being moved out of its original department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingError {
    pub original_department_id: String,
    pub original_department_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A support ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub ticket_type: TicketType,
    pub department_id: String,
    pub department_name: String,
    pub status: TicketStatus,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<TicketMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_confidence: Option<f64>,
    #[serde(default)]
    pub auto_resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_accuracy: Option<f64>,
    /// Milliseconds from creation to the first operator or AI reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_response_ms: Option<i64>,
    /// Milliseconds from creation to resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_error: Option<RoutingError>,
}

impl Ticket {
    /// Create an open ticket routed by a classification.
    pub fn new(request: &NewTicket, classification: &Classification) -> Self {
        let now = Utc::now();
        Self {
            id: generate_ticket_id(),
            title: request.title.clone(),
            description: request.description.clone(),
            category: classification.category.clone(),
            priority: classification.priority,
            ticket_type: classification.ticket_type,
            department_id: classification.department_id.clone(),
            department_name: classification.department_name.clone(),
            status: TicketStatus::Open,
            user_id: request.user_id.clone(),
            user_name: request
                .user_name
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            user_email: request
                .user_email
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_EMAIL.to_string()),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
            ai_confidence: Some(classification.confidence),
            auto_resolved: false,
            classification_accuracy: Some(classification.confidence),
            first_response_ms: None,
            resolution_ms: None,
            routing_error: None,
        }
    }

    /// Milliseconds elapsed between creation and `at`.
    pub fn elapsed_ms(&self, at: DateTime<Utc>) -> i64 {
        (at - self.created_at).num_milliseconds().max(0)
    }

    /// Metrics with missing values derived from the conversation.
    pub fn metrics(&self, now: DateTime<Utc>) -> TicketMetrics {
        let first_response_ms = self.first_response_ms.or_else(|| {
            if self.messages.len() > 1 {
                self.messages
                    .iter()
                    .find(|m| m.sender != Sender::User)
                    .map(|m| self.elapsed_ms(m.created_at))
            } else {
                None
            }
        });

        let resolution_ms = self.resolution_ms.or_else(|| {
            self.status
                .is_terminal()
                .then(|| self.elapsed_ms(now))
        });

        TicketMetrics {
            classification_accuracy: self.classification_accuracy.or(self.ai_confidence),
            first_response_ms,
            resolution_ms,
            routing_error: self.routing_error.clone(),
        }
    }
}

/// Input for creating a ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

/// Partial update applied by an operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketUpdate {
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Derived ticket metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketMetrics {
    pub classification_accuracy: Option<f64>,
    pub first_response_ms: Option<i64>,
    pub resolution_ms: Option<i64>,
    pub routing_error: Option<RoutingError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::fallback_classification;
    use chrono::Duration;

    fn sample_ticket() -> Ticket {
        let request = NewTicket {
            title: "Пароль".to_string(),
            description: "Не могу войти".to_string(),
            user_id: "u1".to_string(),
            ..Default::default()
        };
        Ticket::new(&request, &fallback_classification("Не могу войти"))
    }

    #[test]
    fn test_ids_are_unique() {
        let a = generate_ticket_id();
        let b = generate_ticket_id();
        assert_ne!(a, b);
        assert!(a.starts_with("ticket-"));
        assert!(generate_message_id().starts_with("msg-"));
    }

    #[test]
    fn test_new_ticket_defaults() {
        let ticket = sample_ticket();
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.department_id, "tech");
        assert_eq!(ticket.user_name, DEFAULT_USER_NAME);
        assert_eq!(ticket.user_email, DEFAULT_USER_EMAIL);
        assert_eq!(ticket.ai_confidence, Some(0.6));
        assert_eq!(ticket.classification_accuracy, Some(0.6));
        assert!(!ticket.auto_resolved);
    }

    #[test]
    fn test_status_parsing_and_terminal() {
        assert_eq!(TicketStatus::from_str_opt("in_progress"), Some(TicketStatus::InProgress));
        assert_eq!(TicketStatus::from_str_opt("done"), None);
        assert!(TicketStatus::Closed.is_terminal());
        assert!(TicketStatus::Resolved.is_terminal());
        assert!(!TicketStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_metrics_derives_first_response() {
        let mut ticket = sample_ticket();
        let created = ticket.created_at;
        ticket.messages.push(TicketMessage::new(&ticket.id, "q", Sender::User, "u"));
        let mut reply = TicketMessage::new(&ticket.id, "a", Sender::Operator, "op");
        reply.created_at = created + Duration::milliseconds(1500);
        ticket.messages.push(reply);

        let metrics = ticket.metrics(Utc::now());
        assert_eq!(metrics.first_response_ms, Some(1500));
        assert_eq!(metrics.resolution_ms, None);
    }

    #[test]
    fn test_metrics_derives_resolution_for_terminal() {
        let mut ticket = sample_ticket();
        ticket.status = TicketStatus::Resolved;
        let now = ticket.created_at + Duration::seconds(60);

        let metrics = ticket.metrics(now);
        assert_eq!(metrics.resolution_ms, Some(60_000));
    }

    #[test]
    fn test_metrics_prefers_stored_values() {
        let mut ticket = sample_ticket();
        ticket.status = TicketStatus::Closed;
        ticket.first_response_ms = Some(10);
        ticket.resolution_ms = Some(20);
        ticket.classification_accuracy = None;

        let metrics = ticket.metrics(Utc::now());
        assert_eq!(metrics.first_response_ms, Some(10));
        assert_eq!(metrics.resolution_ms, Some(20));
        assert_eq!(metrics.classification_accuracy, Some(0.6));
    }

    #[test]
    fn test_ticket_json_roundtrip_skips_empty_fields() {
        let ticket = sample_ticket();
        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["status"], "open");
        assert!(json.get("routing_error").is_none());

        let parsed: Ticket = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, ticket);
    }
}
