//! Unified error types for triage with a fail-safe philosophy.
//!
//! Errors in the triage core never reach the person filing a ticket. When an
//! external capability fails, we log a warning and substitute the
//! deterministic path, and every substitute leans toward human handoff
//! rather than automatic closure.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for triage operations.
#[derive(Error, Debug)]
pub enum TriageError {
    /// No generative capability is configured (no credential, disabled).
    #[error("capability unavailable")]
    CapabilityUnavailable,

    /// The capability call failed or returned unusable data.
    #[error("capability error: {message}")]
    Capability { message: String },

    /// Structured confidence signals could not be parsed.
    #[error("signal parse error: {message}")]
    SignalParse { message: String },

    /// I/O errors from ticket or config files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Ticket not found in storage.
    #[error("ticket not found: {ticket_id}")]
    TicketNotFound { ticket_id: String },

    /// Caller supplied an incomplete or malformed request.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

/// A specialized Result type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;

impl TriageError {
    /// Create a capability error.
    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability {
            message: message.into(),
        }
    }

    /// Create a signal parse error.
    pub fn signal_parse(message: impl Into<String>) -> Self {
        Self::SignalParse {
            message: message.into(),
        }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a ticket not found error.
    pub fn ticket_not_found(ticket_id: impl Into<String>) -> Self {
        Self::TicketNotFound {
            ticket_id: ticket_id.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Whether this error came from the external capability.
    ///
    /// Capability errors are recovered locally by the deterministic
    /// heuristics; `Unavailable` and `Capability` are treated identically.
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            Self::CapabilityUnavailable | Self::Capability { .. } | Self::SignalParse { .. }
        )
    }
}

impl From<io::Error> for TriageError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for TriageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::capability(format!("request timed out: {}", err))
        } else {
            Self::capability(format!("request failed: {}", err))
        }
    }
}

/// Trait for fail-safe error handling.
///
/// Logs the error and substitutes a value that never widens what the
/// system does automatically.
pub trait FailSafe<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_safe_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_safe_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailSafe<T> for Result<T> {
    fn fail_safe_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-safe: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_safe_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-safe: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Process exit codes for the CLI.
pub mod exit_codes {
    /// Command succeeded.
    pub const SUCCESS: i32 = 0;

    /// Command failed (bad input, missing ticket, storage error).
    pub const ERROR: i32 = 1;

    /// The process panicked.
    pub const CRASH: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_unavailable_display() {
        let err = TriageError::CapabilityUnavailable;
        assert_eq!(err.to_string(), "capability unavailable");
    }

    #[test]
    fn test_capability_error_display() {
        let err = TriageError::capability("HTTP 500");
        assert_eq!(err.to_string(), "capability error: HTTP 500");
    }

    #[test]
    fn test_storage_error_display() {
        let err = TriageError::storage(
            "/tmp/ticket.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/ticket.json"));
    }

    #[test]
    fn test_ticket_not_found_display() {
        let err = TriageError::ticket_not_found("ticket-1");
        assert_eq!(err.to_string(), "ticket not found: ticket-1");
    }

    #[test]
    fn test_invalid_input_display() {
        let err = TriageError::invalid_input("missing title");
        assert_eq!(err.to_string(), "invalid input: missing title");
    }

    #[test]
    fn test_is_capability_failure() {
        assert!(TriageError::CapabilityUnavailable.is_capability_failure());
        assert!(TriageError::capability("x").is_capability_failure());
        assert!(TriageError::signal_parse("x").is_capability_failure());
        assert!(!TriageError::config("x").is_capability_failure());
        assert!(!TriageError::ticket_not_found("x").is_capability_failure());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: TriageError = io_err.into();
        assert!(matches!(err, TriageError::Storage { .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: TriageError = json_err.into();
        assert!(matches!(err, TriageError::Serde { .. }));
    }

    #[test]
    fn test_fail_safe_default() {
        let result: Result<Vec<String>> = Err(TriageError::CapabilityUnavailable);
        let value = result.fail_safe_default("test context");
        assert!(value.is_empty());
    }

    #[test]
    fn test_fail_safe_with() {
        let result: Result<f64> = Err(TriageError::capability("boom"));
        assert_eq!(result.fail_safe_with("test context", 0.0), 0.0);
    }

    #[test]
    fn test_fail_safe_success() {
        let result: Result<i32> = Ok(100);
        assert_eq!(result.fail_safe_default("test context"), 100);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::ERROR, 1);
        assert_eq!(exit_codes::CRASH, 3);
    }
}
