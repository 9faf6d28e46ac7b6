//! In-memory ticket storage.
//!
//! Thread-safe `RwLock<HashMap>` store. Tickets are lost when the store is
//! dropped.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::error::{Result, TriageError};
use crate::tickets::model::{Ticket, TicketMessage};
use crate::tickets::traits::{sort_newest_first, TicketStore};

#[derive(Debug, Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<HashMap<String, Ticket>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A poisoned lock still holds consistent data: every write is a single insert.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Ticket>> {
        self.tickets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Ticket>> {
        self.tickets.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl TicketStore for MemoryTicketStore {
    fn create(&self, ticket: &Ticket) -> Result<()> {
        self.write().insert(ticket.id.clone(), ticket.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>> {
        Ok(self.read().get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self.read().values().cloned().collect();
        sort_newest_first(&mut tickets);
        Ok(tickets)
    }

    fn update(&self, ticket: &Ticket) -> Result<()> {
        let mut tickets = self.write();
        match tickets.get_mut(&ticket.id) {
            Some(stored) => {
                *stored = ticket.clone();
                Ok(())
            }
            None => Err(TriageError::ticket_not_found(&ticket.id)),
        }
    }

    fn add_message(&self, ticket_id: &str, message: &TicketMessage) -> Result<Ticket> {
        let mut tickets = self.write();
        let ticket = tickets
            .get_mut(ticket_id)
            .ok_or_else(|| TriageError::ticket_not_found(ticket_id))?;

        ticket.messages.push(message.clone());
        ticket.updated_at = Utc::now();
        Ok(ticket.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tickets::traits::tests::{
        sample_ticket, test_ticket_store_crud, test_ticket_store_listing,
    };
    use std::sync::Arc;

    #[test]
    fn test_memory_store_crud() {
        test_ticket_store_crud(&MemoryTicketStore::new());
    }

    #[test]
    fn test_memory_store_listing() {
        test_ticket_store_listing(&MemoryTicketStore::new());
    }

    #[test]
    fn test_len_and_is_empty() {
        let store = MemoryTicketStore::new();
        assert!(store.is_empty());
        store.create(&sample_ticket("Где счет?")).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_arc_store_shares_state() {
        let store = Arc::new(MemoryTicketStore::new());
        let shared = Arc::clone(&store);
        let ticket = sample_ticket("Отпуск");

        shared.create(&ticket).unwrap();
        assert!(store.get(&ticket.id).unwrap().is_some());
    }
}
