//! Transport-level error types.

use chainevents_core::{EventError, ResourceNode};
use thiserror::Error;

/// Errors that can occur while talking to a backend over HTTP.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, DNS, TLS, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl TransportError {
    /// Returns `true` if this error is retryable (transient).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { code, .. } => *code == 429 || *code >= 500,
            Self::Deserialization(_) => false,
        }
    }

    /// Map into the event taxonomy as seen from `node`.
    pub fn into_event_error(self, node: ResourceNode, what: &str) -> EventError {
        match self {
            Self::Status { code: 404, .. } => EventError::not_found(node, what),
            other => EventError::unavailable(node, other.to_string()),
        }
    }
}
