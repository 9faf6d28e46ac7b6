//! Support tickets.
//!
//! - `model`: tickets, messages and metrics
//! - `traits`: the `TicketStore` trait
//! - `memory` / `file`: store implementations
//! - `service`: the create / reply / update workflow

pub mod file;
pub mod memory;
pub mod model;
pub mod service;
pub mod traits;

pub use file::FileTicketStore;
pub use memory::MemoryTicketStore;
pub use model::{
    NewTicket, RoutingError, Sender, Ticket, TicketMessage, TicketMetrics, TicketStatus,
    TicketUpdate,
};
pub use service::{CreatedTicket, TicketService};
pub use traits::TicketStore;

use crate::config::Config;
use crate::error::{Result, TriageError};

/// Open the ticket store described by config.
pub fn open_store(config: &Config) -> Result<Box<dyn TicketStore>> {
    match config.tickets.store.as_str() {
        "memory" => Ok(Box::new(MemoryTicketStore::new())),
        _ => {
            let dir = config.tickets_dir().ok_or_else(|| {
                TriageError::config("could not determine tickets directory (no home directory)")
            })?;
            Ok(Box::new(FileTicketStore::with_dir(dir)?))
        }
    }
}
