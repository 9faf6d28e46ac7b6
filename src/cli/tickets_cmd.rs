//! Ticket commands.
//!
//! Create, inspect and work tickets through `TicketService`, plus operator
//! assist (reply suggestions and summaries) on a stored conversation.

use serde::Serialize;

use crate::core::assist::TicketContext;
use crate::core::classifier::Classification;
use crate::core::resolver::ResolutionDecision;
use crate::engine::Triage;
use crate::error::Result;
use crate::tickets::{
    NewTicket, Sender, Ticket, TicketMessage, TicketMetrics, TicketService, TicketStore,
    TicketUpdate,
};

/// Default number of reply suggestions.
pub const DEFAULT_SUGGESTIONS: usize = 3;

/// Options for ticket commands.
#[derive(Debug, Clone, Default)]
pub struct TicketsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of tickets listed.
    pub limit: Option<usize>,
}

/// Listing row.
#[derive(Debug, Clone, Serialize)]
pub struct TicketSummary {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub department_id: String,
    pub auto_resolved: bool,
    pub messages: usize,
}

impl From<&Ticket> for TicketSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            title: ticket.title.clone(),
            status: ticket.status.as_str().to_string(),
            priority: ticket.priority.as_str().to_string(),
            department_id: ticket.department_id.clone(),
            auto_resolved: ticket.auto_resolved,
            messages: ticket.messages.len(),
        }
    }
}

/// Output format for ticket commands. Only the fields an action produces
/// are serialized.
#[derive(Debug, Clone, Serialize)]
pub struct TicketsOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// The action performed.
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<TicketSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<ResolutionDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TicketMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<TicketMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TicketsOutput {
    /// Create a successful output with no payload.
    pub fn success(action: impl Into<String>) -> Self {
        Self {
            success: true,
            action: action.into(),
            ticket: None,
            tickets: Vec::new(),
            classification: None,
            decision: None,
            metrics: None,
            message: None,
            suggestions: Vec::new(),
            summary: None,
            translation: None,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(action: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::success(action)
        }
    }

    fn from_result(action: &str, result: Result<Self>) -> Self {
        result.unwrap_or_else(|e| Self::failure(action, e.to_string()))
    }
}

/// Ticket command implementation.
pub struct TicketsCommand<'a, S: TicketStore> {
    triage: &'a Triage,
    service: TicketService<'a, S>,
}

impl<'a, S: TicketStore> TicketsCommand<'a, S> {
    pub fn new(triage: &'a Triage, store: S) -> Self {
        Self {
            triage,
            service: TicketService::new(triage, store),
        }
    }

    /// Create a ticket, classifying and possibly auto-resolving it.
    pub fn create(&self, request: NewTicket) -> TicketsOutput {
        TicketsOutput::from_result(
            "create",
            self.service.create(request).map(|created| TicketsOutput {
                ticket: Some(created.ticket),
                classification: Some(created.classification),
                decision: Some(created.decision),
                metrics: Some(created.metrics),
                ..TicketsOutput::success("create")
            }),
        )
    }

    /// List tickets, newest first.
    pub fn list(&self, department_id: Option<&str>, options: &TicketsOptions) -> TicketsOutput {
        TicketsOutput::from_result(
            "list",
            self.service.list(department_id).map(|tickets| {
                let limit = options.limit.unwrap_or(usize::MAX);
                TicketsOutput {
                    tickets: tickets.iter().take(limit).map(TicketSummary::from).collect(),
                    ..TicketsOutput::success("list")
                }
            }),
        )
    }

    /// Show one ticket with its metrics.
    pub fn show(&self, ticket_id: &str) -> TicketsOutput {
        let result = self.service.get(ticket_id).and_then(|ticket| {
            let metrics = self.service.metrics(ticket_id)?;
            Ok(TicketsOutput {
                ticket: Some(ticket),
                metrics: Some(metrics),
                ..TicketsOutput::success("show")
            })
        });
        TicketsOutput::from_result("show", result)
    }

    /// Append a message to a ticket.
    pub fn reply(
        &self,
        ticket_id: &str,
        content: &str,
        sender: Sender,
        sender_name: &str,
    ) -> TicketsOutput {
        TicketsOutput::from_result(
            "reply",
            self.service
                .reply(ticket_id, content, sender, sender_name)
                .map(|(ticket, message)| TicketsOutput {
                    ticket: Some(ticket),
                    message: Some(message),
                    ..TicketsOutput::success("reply")
                }),
        )
    }

    /// Apply an operator update.
    pub fn update(&self, ticket_id: &str, update: TicketUpdate) -> TicketsOutput {
        let result = self.service.update(ticket_id, update).and_then(|ticket| {
            let metrics = self.service.metrics(&ticket.id)?;
            Ok(TicketsOutput {
                ticket: Some(ticket),
                metrics: Some(metrics),
                ..TicketsOutput::success("update")
            })
        });
        TicketsOutput::from_result("update", result)
    }

    /// Suggest operator replies for a ticket's conversation.
    pub fn suggest(&self, ticket_id: &str, count: usize) -> TicketsOutput {
        let result = self.service.get(ticket_id).map(|ticket| {
            let history = conversation(&ticket);
            let context = TicketContext {
                title: Some(ticket.title.clone()),
                category: Some(ticket.category.clone()),
                priority: Some(ticket.priority.as_str().to_string()),
                ticket_type: Some(ticket.ticket_type.as_str().to_string()),
                department: Some(ticket.department_name.clone()),
            };
            let suggestions =
                self.triage
                    .suggest_replies(&ticket.description, &history, count, Some(&context));
            TicketsOutput {
                suggestions,
                ..TicketsOutput::success("suggest")
            }
        });
        TicketsOutput::from_result("suggest", result)
    }

    /// Summarize a ticket's conversation.
    pub fn summarize(&self, ticket_id: &str) -> TicketsOutput {
        let result = self.service.get(ticket_id).map(|ticket| TicketsOutput {
            summary: Some(self.triage.summarize(&conversation(&ticket))),
            ..TicketsOutput::success("summarize")
        });
        TicketsOutput::from_result("summarize", result)
    }

    /// Translate one message and keep the translation on it.
    pub fn translate(&self, ticket_id: &str, message_id: &str, target: &str) -> TicketsOutput {
        TicketsOutput::from_result(
            "translate",
            self.service
                .translate_message(ticket_id, message_id, target)
                .map(|translation| TicketsOutput {
                    translation: Some(translation),
                    ..TicketsOutput::success("translate")
                }),
        )
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &TicketsOutput, options: &TicketsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            format_human_readable(output)
        }
    }
}

/// Message contents in order, as plain strings.
fn conversation(ticket: &Ticket) -> Vec<String> {
    ticket.messages.iter().map(|m| m.content.clone()).collect()
}

fn format_human_readable(output: &TicketsOutput) -> String {
    if !output.success {
        return format!(
            "Ticket {} failed: {}\n",
            output.action,
            output.error.as_deref().unwrap_or("unknown error")
        );
    }

    let mut lines = Vec::new();

    if output.action == "list" {
        if output.tickets.is_empty() {
            return "No tickets found.\n".to_string();
        }
        for summary in &output.tickets {
            lines.push(format!(
                "{}  [{}] [{}] {} ({}, {} message(s){})",
                summary.id,
                summary.status,
                summary.priority,
                summary.title,
                summary.department_id,
                summary.messages,
                if summary.auto_resolved { ", auto" } else { "" }
            ));
        }
        lines.push(String::new());
        return lines.join("\n");
    }

    if let Some(ticket) = &output.ticket {
        lines.push(format!("Ticket: {}", ticket.id));
        lines.push(format!("  Title:      {}", ticket.title));
        lines.push(format!("  Status:     {}", ticket.status.as_str()));
        lines.push(format!(
            "  Department: {} ({})",
            ticket.department_name, ticket.department_id
        ));
        lines.push(format!("  Priority:   {}", ticket.priority.as_str()));
        lines.push(format!("  Category:   {}", ticket.category));
        if ticket.auto_resolved {
            lines.push("  Auto-resolved: yes".to_string());
        }
        if let Some(routing) = &ticket.routing_error {
            lines.push(format!(
                "  Rerouted from: {}",
                routing.original_department_id
            ));
        }
        if output.action == "show" {
            for message in &ticket.messages {
                lines.push(format!("  - {}: {}", message.sender_name, message.content));
            }
        }
    }

    if let Some(decision) = &output.decision {
        lines.push(format!(
            "  Resolution: {:?} (confidence: {:.2})",
            decision.outcome(),
            decision.confidence()
        ));
    }

    if let Some(metrics) = &output.metrics {
        if let Some(ms) = metrics.first_response_ms {
            lines.push(format!("  First response: {} ms", ms));
        }
        if let Some(ms) = metrics.resolution_ms {
            lines.push(format!("  Resolution:     {} ms", ms));
        }
    }

    if let Some(message) = &output.message {
        lines.push(format!("Message {} added", message.id));
    }

    for (i, suggestion) in output.suggestions.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, suggestion));
    }

    if let Some(summary) = &output.summary {
        lines.push(summary.clone());
    }

    if let Some(translation) = &output.translation {
        lines.push(translation.clone());
    }

    lines.push(String::new());
    lines.join("\n")
}
