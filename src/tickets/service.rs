//! Ticket workflow: creation with auto-resolution, replies and updates.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::classifier::Classification;
use crate::core::department;
use crate::core::resolver::{Outcome, ResolutionContext, ResolutionDecision};
use crate::engine::Triage;
use crate::error::{Result, TriageError};
use crate::tickets::model::{
    NewTicket, RoutingError, Sender, Ticket, TicketMessage, TicketMetrics, TicketStatus,
    TicketUpdate, AI_SENDER_NAME, REROUTE_REASON,
};
use crate::tickets::traits::TicketStore;

/// Result of creating a ticket.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTicket {
    pub ticket: Ticket,
    pub classification: Classification,
    pub decision: ResolutionDecision,
    pub metrics: TicketMetrics,
}

/// Ticket workflow over a store.
pub struct TicketService<'a, S: TicketStore> {
    triage: &'a Triage,
    store: S,
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(TriageError::invalid_input(format!("missing {}", field)))
    } else {
        Ok(())
    }
}

impl<'a, S: TicketStore> TicketService<'a, S> {
    pub fn new(triage: &'a Triage, store: S) -> Self {
        Self { triage, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a ticket: classify, try to resolve, store.
    ///
    /// The ticket is closed with an AI reply only when the resolution
    /// decision says so.
    pub fn create(&self, request: NewTicket) -> Result<CreatedTicket> {
        require(&request.title, "title")?;
        require(&request.description, "description")?;
        require(&request.user_id, "user id")?;

        let classification = self
            .triage
            .classify_ticket(&format!("{}\n\n{}", request.title, request.description));

        let context = ResolutionContext {
            category: Some(classification.category.clone()),
            ticket_type: Some(classification.ticket_type.as_str().to_string()),
            department: Some(classification.department_name.clone()),
        };
        let mut decision = self
            .triage
            .resolve_automatically(&request.description, Some(&context));

        // A rejected knowledge match gets one open attempt, kept only if it
        // clears the gate.
        if decision.outcome() == Outcome::Deferred && decision.source_entry_id().is_some() {
            let retry = self.triage.resolve_open(&request.description, Some(&context));
            if retry.should_auto_close() {
                debug!(confidence = retry.confidence(), "open answer replaced rejected match");
                decision = retry;
            }
        }

        let mut ticket = Ticket::new(&request, &classification);

        let mut user_message =
            TicketMessage::new(&ticket.id, &request.description, Sender::User, &ticket.user_name);
        user_message.created_at = ticket.created_at;
        ticket.messages.push(user_message);

        if decision.should_auto_close() {
            let ai_message = TicketMessage::new(
                &ticket.id,
                decision.answer_text(),
                Sender::Ai,
                AI_SENDER_NAME,
            );
            let elapsed = ticket.elapsed_ms(ai_message.created_at);
            ticket.messages.push(ai_message);
            ticket.first_response_ms = Some(elapsed);
            ticket.resolution_ms = Some(elapsed);
            ticket.status = TicketStatus::Closed;
            ticket.auto_resolved = true;
        }

        self.store.create(&ticket)?;

        info!(
            ticket_id = %ticket.id,
            department = %ticket.department_id,
            priority = ticket.priority.as_str(),
            auto_resolved = ticket.auto_resolved,
            confidence = decision.confidence(),
            "ticket created"
        );

        let metrics = ticket.metrics(Utc::now());
        Ok(CreatedTicket {
            ticket,
            classification,
            decision,
            metrics,
        })
    }

    /// Fetch a ticket or fail with `TicketNotFound`.
    pub fn get(&self, ticket_id: &str) -> Result<Ticket> {
        self.store
            .get(ticket_id)?
            .ok_or_else(|| TriageError::ticket_not_found(ticket_id))
    }

    /// Tickets newest first, optionally for one department.
    pub fn list(&self, department_id: Option<&str>) -> Result<Vec<Ticket>> {
        match department_id {
            Some(id) => self.store.list_by_department(id),
            None => self.store.list(),
        }
    }

    /// Append a message. The first operator or AI reply records the first
    /// response time.
    pub fn reply(
        &self,
        ticket_id: &str,
        content: &str,
        sender: Sender,
        sender_name: &str,
    ) -> Result<(Ticket, TicketMessage)> {
        require(content, "content")?;
        require(sender_name, "sender name")?;

        let existing = self.get(ticket_id)?;
        let message = TicketMessage::new(ticket_id, content, sender, sender_name);
        let mut ticket = self.store.add_message(ticket_id, &message)?;

        if sender != Sender::User && existing.first_response_ms.is_none() {
            ticket.first_response_ms = Some(ticket.elapsed_ms(message.created_at));
            self.store.update(&ticket)?;
            info!(
                ticket_id = %ticket.id,
                first_response_ms = ticket.first_response_ms,
                "first response recorded"
            );
        }

        Ok((ticket, message))
    }

    /// Apply an operator update.
    ///
    /// Moving the ticket to another department records a routing error
    /// (once, against the department it was first routed to). Entering
    /// resolved or closed from an open state records the resolution time.
    pub fn update(&self, ticket_id: &str, update: TicketUpdate) -> Result<Ticket> {
        let original = self.get(ticket_id)?;
        let mut ticket = original.clone();

        if let Some(department_id) = update.department_id.as_deref() {
            let target = department::by_id(department_id.trim()).ok_or_else(|| {
                TriageError::invalid_input(format!("unknown department: {}", department_id))
            })?;

            if target.id != original.department_id {
                if ticket.routing_error.is_none() {
                    ticket.routing_error = Some(RoutingError {
                        original_department_id: original.department_id.clone(),
                        original_department_name: original.department_name.clone(),
                        reason: Some(REROUTE_REASON.to_string()),
                    });
                }
                info!(
                    ticket_id = %ticket.id,
                    from = %original.department_id,
                    to = target.id,
                    "ticket rerouted"
                );
                ticket.department_id = target.id.to_string();
                ticket.department_name = target.name.to_string();
            }
        }

        if let Some(status) = update.status {
            let now = Utc::now();
            if status.is_terminal() && !original.status.is_terminal() {
                ticket.resolution_ms = Some(ticket.elapsed_ms(now));
            }
            if status != original.status {
                info!(
                    ticket_id = %ticket.id,
                    from = original.status.as_str(),
                    to = status.as_str(),
                    "ticket status changed"
                );
            }
            ticket.status = status;
        }

        if let Some(priority) = update.priority {
            ticket.priority = priority;
        }
        if let Some(category) = update.category {
            ticket.category = category;
        }

        ticket.updated_at = Utc::now();
        self.store.update(&ticket)?;
        Ok(ticket)
    }

    /// Derived metrics for a ticket.
    pub fn metrics(&self, ticket_id: &str) -> Result<TicketMetrics> {
        Ok(self.get(ticket_id)?.metrics(Utc::now()))
    }

    /// Translate a message and keep the translation on the message.
    pub fn translate_message(
        &self,
        ticket_id: &str,
        message_id: &str,
        target: &str,
    ) -> Result<String> {
        require(target, "target language")?;

        let mut ticket = self.get(ticket_id)?;
        let message = ticket
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| {
                TriageError::invalid_input(format!("message not found: {}", message_id))
            })?;

        let translated = self.triage.translate(&message.content, target);
        message
            .translated_content
            .insert(target.to_string(), translated.clone());

        self.store.update(&ticket)?;
        Ok(translated)
    }
}
