//! CLI commands for triage.
//!
//! Each command takes its inputs plus an options struct, returns a
//! serializable output, and formats it as JSON or human-readable text:
//! - **Knowledge**: search, resolve
//! - **Routing**: classify, detect
//! - **Text**: translate
//! - **Tickets**: create, list, show, reply, update, suggest, summarize

pub mod classify;
pub mod detect;
pub mod resolve;
pub mod search;
pub mod tickets_cmd;
pub mod translate;

pub use classify::ClassifyCommand;
pub use detect::DetectCommand;
pub use resolve::ResolveCommand;
pub use search::SearchCommand;
pub use tickets_cmd::TicketsCommand;
pub use translate::TranslateCommand;
