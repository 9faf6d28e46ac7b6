//! Ticket storage trait.

use std::sync::Arc;

use crate::error::Result;
use crate::tickets::model::{Ticket, TicketMessage};

/// Trait for ticket storage backends.
///
/// Messages are stored inside their ticket; `add_message` appends and bumps
/// `updated_at`.
pub trait TicketStore: Send + Sync {
    /// Store a new ticket.
    fn create(&self, ticket: &Ticket) -> Result<()>;

    /// Retrieve a ticket by ID.
    ///
    /// Returns `Ok(None)` if the ticket doesn't exist.
    fn get(&self, id: &str) -> Result<Option<Ticket>>;

    /// All tickets, newest first.
    fn list(&self) -> Result<Vec<Ticket>>;

    /// Replace a stored ticket. Fails with `TicketNotFound` if absent.
    fn update(&self, ticket: &Ticket) -> Result<()>;

    /// Append a message to a ticket and return the updated ticket.
    fn add_message(&self, ticket_id: &str, message: &TicketMessage) -> Result<Ticket>;

    /// Tickets routed to a department, newest first.
    fn list_by_department(&self, department_id: &str) -> Result<Vec<Ticket>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| t.department_id == department_id)
            .collect())
    }

    /// Messages of a ticket in order. Empty for unknown tickets.
    fn messages(&self, ticket_id: &str) -> Result<Vec<TicketMessage>> {
        Ok(self.get(ticket_id)?.map(|t| t.messages).unwrap_or_default())
    }
}

/// Blanket implementation of TicketStore for Arc-wrapped stores.
impl<T: TicketStore + ?Sized> TicketStore for Arc<T> {
    fn create(&self, ticket: &Ticket) -> Result<()> {
        (**self).create(ticket)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>> {
        (**self).get(id)
    }

    fn list(&self) -> Result<Vec<Ticket>> {
        (**self).list()
    }

    fn update(&self, ticket: &Ticket) -> Result<()> {
        (**self).update(ticket)
    }

    fn add_message(&self, ticket_id: &str, message: &TicketMessage) -> Result<Ticket> {
        (**self).add_message(ticket_id, message)
    }

    fn list_by_department(&self, department_id: &str) -> Result<Vec<Ticket>> {
        (**self).list_by_department(department_id)
    }

    fn messages(&self, ticket_id: &str) -> Result<Vec<TicketMessage>> {
        (**self).messages(ticket_id)
    }
}

/// Blanket implementation for boxed trait objects.
impl TicketStore for Box<dyn TicketStore> {
    fn create(&self, ticket: &Ticket) -> Result<()> {
        (**self).create(ticket)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>> {
        (**self).get(id)
    }

    fn list(&self) -> Result<Vec<Ticket>> {
        (**self).list()
    }

    fn update(&self, ticket: &Ticket) -> Result<()> {
        (**self).update(ticket)
    }

    fn add_message(&self, ticket_id: &str, message: &TicketMessage) -> Result<Ticket> {
        (**self).add_message(ticket_id, message)
    }

    fn list_by_department(&self, department_id: &str) -> Result<Vec<Ticket>> {
        (**self).list_by_department(department_id)
    }

    fn messages(&self, ticket_id: &str) -> Result<Vec<TicketMessage>> {
        (**self).messages(ticket_id)
    }
}

/// Newest first; ties broken by id so the order is total.
pub(crate) fn sort_newest_first(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}
