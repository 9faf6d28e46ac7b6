//! File-based ticket storage.
//!
//! One JSON file per ticket in `~/.triage/tickets/` (or the configured
//! directory). Atomic writes are achieved via temp file + rename pattern.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;
use tracing::warn;

use crate::error::{Result, TriageError};
use crate::tickets::model::{Ticket, TicketMessage};
use crate::tickets::traits::{sort_newest_first, TicketStore};

/// File-based ticket storage.
#[derive(Debug)]
pub struct FileTicketStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles within the process.
    lock: RwLock<()>,
}

/// Ticket ids become file names, so only a safe alphabet is accepted.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FileTicketStore {
    /// Create a store in `dir`, creating the directory if needed.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| TriageError::storage(&dir, e))?;
        }

        Ok(Self {
            dir,
            lock: RwLock::new(()),
        })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn ticket_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", id))
    }

    fn read_ticket(&self, id: &str) -> Result<Option<Ticket>> {
        if !is_safe_id(id) {
            return Ok(None);
        }

        let path = self.ticket_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| TriageError::storage(&path, e))?;
        let ticket: Ticket = serde_json::from_str(&content)?;
        Ok(Some(ticket))
    }

    /// Write a ticket atomically using temp file + rename.
    fn atomic_write(&self, ticket: &Ticket) -> Result<()> {
        if !is_safe_id(&ticket.id) {
            return Err(TriageError::invalid_input(format!(
                "ticket id is not a safe file name: {}",
                ticket.id
            )));
        }

        let final_path = self.ticket_path(&ticket.id);
        let temp_path = self.temp_path(&ticket.id);

        let json = serde_json::to_string_pretty(ticket)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| TriageError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| TriageError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| TriageError::storage(&temp_path, e))?;
        }

        // atomic on POSIX
        fs::rename(&temp_path, &final_path).map_err(|e| TriageError::storage(&final_path, e))?;

        Ok(())
    }
}

impl TicketStore for FileTicketStore {
    fn create(&self, ticket: &Ticket) -> Result<()> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        self.atomic_write(ticket)
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        self.read_ticket(id)
    }

    fn list(&self) -> Result<Vec<Ticket>> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());

        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut tickets = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| TriageError::storage(&self.dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| TriageError::storage(&self.dir, e))?;
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            if path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true)
            {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(|e| TriageError::storage(&path, e))
                .and_then(|content| Ok(serde_json::from_str::<Ticket>(&content)?));
            match parsed {
                Ok(ticket) => tickets.push(ticket),
                Err(e) => warn!("skipping unreadable ticket file {}: {}", path.display(), e),
            }
        }

        sort_newest_first(&mut tickets);
        Ok(tickets)
    }

    fn update(&self, ticket: &Ticket) -> Result<()> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());

        if self.read_ticket(&ticket.id)?.is_none() {
            return Err(TriageError::ticket_not_found(&ticket.id));
        }
        self.atomic_write(ticket)
    }

    fn add_message(&self, ticket_id: &str, message: &TicketMessage) -> Result<Ticket> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());

        let mut ticket = self
            .read_ticket(ticket_id)?
            .ok_or_else(|| TriageError::ticket_not_found(ticket_id))?;

        ticket.messages.push(message.clone());
        ticket.updated_at = Utc::now();
        self.atomic_write(&ticket)?;

        Ok(ticket)
    }
}
