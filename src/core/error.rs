//! Error types for the sitesweep library.
//!
//! This module provides structured, typed errors for all failure scenarios.
//! The library never panics; all errors are returned as `Result` values.

use std::time::Duration;
use thiserror::Error;

/// HTTP-like status codes that mark a server error as transient.
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Message substrings that mark a status-less server error as transient.
///
/// Matched case-insensitively against the error's description when the
/// server did not attach a status code.
pub const RETRYABLE_MESSAGE_PATTERNS: [&str; 6] = [
    "timeout",
    "connection",
    "rate limit",
    "server error",
    "service unavailable",
    "internal server error",
];

/// The main error type for governance sweep operations.
///
/// All error variants include context about what failed and why,
/// enabling proper error handling and debugging.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// A required setting is missing or still set to a placeholder.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem, naming the setting.
        message: String,
    },

    /// The server rejected the provided credentials.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Reason reported by the server.
        reason: String,
    },

    /// The server responded with an error condition.
    #[error("server error{}: {message}", format_status(.status))]
    Server {
        /// HTTP-like status code, when the server attached one.
        status: Option<u16>,
        /// Error message from the server response.
        message: String,
    },

    /// Failed to reach the server at the transport level.
    #[error("connection failed: {message}")]
    Connection {
        /// Description of the transport failure.
        message: String,
    },

    /// An operation did not complete within its time budget.
    #[error("operation '{operation}' timed out after {elapsed:?}")]
    Timeout {
        /// Name of the operation that timed out.
        operation: String,
        /// How long the operation ran before timing out.
        elapsed: Duration,
    },

    /// The coordinator was used out of order, e.g. scanning before connecting.
    #[error("session error: {message}")]
    Session {
        /// Description of the usage mistake.
        message: String,
    },

    /// An I/O error occurred while writing reports or reading config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be serialized or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GovernanceError {
    /// Returns `true` if this error is transient and worth retrying.
    ///
    /// Connection and timeout failures always qualify. Server errors
    /// qualify when their status is in [`RETRYABLE_STATUS_CODES`], or,
    /// when no status is available, when the message matches one of
    /// [`RETRYABLE_MESSAGE_PATTERNS`].
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } => true,
            Self::Server { status, message } => match status {
                Some(code) => RETRYABLE_STATUS_CODES.contains(code),
                None => {
                    let message = message.to_lowercase();
                    RETRYABLE_MESSAGE_PATTERNS
                        .iter()
                        .any(|pattern| message.contains(pattern))
                }
            },
            _ => false,
        }
    }

    /// Returns `true` if this is a "server responded with error" condition.
    ///
    /// This is the class the sweep coordinator absorbs per site: one broken
    /// site is skipped instead of aborting the whole run.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an `Authentication` error.
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Creates a `Server` error with a status code.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a `Server` error without a status code.
    pub fn server_message(message: impl Into<String>) -> Self {
        Self::Server {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a `Connection` error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(operation: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed,
        }
    }

    /// Creates a `Session` usage error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

/// A specialized `Result` type for sweep operations.
pub type SweepResult<T> = Result<T, GovernanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_status_codes() {
        for code in RETRYABLE_STATUS_CODES {
            assert!(GovernanceError::server(code, "boom").is_retryable());
        }
        assert!(!GovernanceError::server(404, "not found").is_retryable());
        assert!(!GovernanceError::server(401, "unauthorized").is_retryable());
    }

    #[test]
    fn test_retryable_message_patterns() {
        let err = GovernanceError::server_message("Gateway Timeout while proxying");
        assert!(err.is_retryable());

        let err = GovernanceError::server_message("Rate Limit exceeded for token");
        assert!(err.is_retryable());

        let err = GovernanceError::server_message("site not found");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_connection_and_timeout_always_retryable() {
        assert!(GovernanceError::connection("refused").is_retryable());
        assert!(GovernanceError::timeout("list_sites", Duration::from_secs(30)).is_retryable());
    }

    #[test]
    fn test_fatal_classes_not_retryable() {
        assert!(!GovernanceError::configuration("missing url").is_retryable());
        assert!(!GovernanceError::authentication("bad token").is_retryable());
        assert!(!GovernanceError::session("scan before connect").is_retryable());
    }

    #[test]
    fn test_server_error_class() {
        assert!(GovernanceError::server(503, "unavailable").is_server_error());
        assert!(GovernanceError::server(404, "gone").is_server_error());
        assert!(!GovernanceError::connection("refused").is_server_error());
        assert!(!GovernanceError::session("oops").is_server_error());
    }

    #[test]
    fn test_display_includes_status() {
        let err = GovernanceError::server(503, "unavailable");
        assert!(err.to_string().contains("503"));

        let err = GovernanceError::server_message("unavailable");
        assert!(!err.to_string().contains("status"));
    }
}
