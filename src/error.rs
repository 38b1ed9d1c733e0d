use thiserror::Error;

use crate::ports::{HostError, RepositoryError};
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timed out: {action}")]
    Timeout { action: String },

    #[error("Gateway unavailable: {action} returned {status} after {attempts} attempts")]
    GatewayUnavailable {
        action: String,
        status: u16,
        attempts: u32,
    },

    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),

    #[error("Remote error: {0}")]
    Remote(RemoteError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Close(#[from] CloseFailure),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl GatewayError {
    /// True for failures where nothing reached the remote business logic, so
    /// resending the same logical attempt (same reference id) is safe.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GatewayError::Request(_)
                | GatewayError::Timeout { .. }
                | GatewayError::GatewayUnavailable { .. }
                | GatewayError::CircuitBreakerOpen(_)
        )
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        GatewayError::Validation(err.to_string())
    }
}

/// A non-2xx answer from the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
    pub body: String,
}

impl RemoteError {
    /// `"{status} {code}: {message}"` for structured error bodies, otherwise
    /// `"{status} {body}"`.
    pub fn formatted(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{} {}: {}", self.status, code, message),
            _ => format!("{} {}", self.status, self.body),
        }
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// Raised when CloseOrderReference is rejected. Kept apart from
/// `GatewayError::Remote` so callers can ignore an already-closed reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CloseFailure {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl From<RemoteError> for CloseFailure {
    fn from(err: RemoteError) -> Self {
        CloseFailure {
            status: err.status,
            message: err.formatted(),
            code: err.code,
        }
    }
}
