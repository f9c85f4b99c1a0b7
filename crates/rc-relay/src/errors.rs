//! RC relay error types.
//!
//! Error types map to HTTP-style status codes so that REST collaborators
//! (create/stop session, device RC status) can render responses directly.
//! Internal details are logged server-side but not exposed to clients.

use crate::config::ConfigError;
use thiserror::Error;

/// RC relay error type.
///
/// Maps to status codes:
/// - `SessionExists`: `CONFLICT` (409)
/// - `SessionNotFound`: `NOT_FOUND` (404)
/// - `Draining`: `SERVICE_UNAVAILABLE` (503)
/// - `Config`, `Internal`: `INTERNAL_SERVER_ERROR` (500)
#[derive(Debug, Error)]
pub enum RelayError {
    /// A session with the requested id is already registered.
    #[error("Session already exists")]
    SessionExists,

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Registry is draining (graceful shutdown), no new sessions accepted.
    #[error("Registry is draining")]
    Draining,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (mailbox or reply channel failure).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the HTTP status code a REST collaborator should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::SessionExists => 409,
            RelayError::SessionNotFound(_) => 404,
            RelayError::Draining => 503,
            RelayError::Config(_) | RelayError::Internal(_) => 500,
        }
    }

    /// Returns a client-safe error message (no internal details).
    pub fn client_message(&self) -> String {
        match self {
            RelayError::SessionExists => "Session already exists".to_string(),
            RelayError::SessionNotFound(_) => "Session not found".to_string(),
            RelayError::Draining => "Server is shutting down, please retry".to_string(),
            RelayError::Config(_) | RelayError::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }

    /// Bounded label for the `error_type` metric dimension.
    pub const fn kind(&self) -> &'static str {
        match self {
            RelayError::SessionExists => "session_exists",
            RelayError::SessionNotFound(_) => "session_not_found",
            RelayError::Draining => "draining",
            RelayError::Config(_) => "config",
            RelayError::Internal(_) => "internal",
        }
    }
}

impl From<ConfigError> for RelayError {
    fn from(err: ConfigError) -> Self {
        RelayError::Config(err.to_string())
    }
}
