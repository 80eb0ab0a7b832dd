//! Error types for the event retrieval pipeline.

use thiserror::Error;

use crate::event::ResourceNode;

/// Errors that can occur while decoding a single raw log against an ABI entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Event '{event}': expected {expected} topics, got {got}")]
    TopicCountMismatch {
        event: String,
        expected: usize,
        got: usize,
    },

    #[error("Event '{event}': selector mismatch, expected {expected}, got {got}")]
    SelectorMismatch {
        event: String,
        expected: String,
        got: String,
    },

    #[error("Event '{event}': data length {got} does not fit the ABI ({expected})")]
    DataLengthMismatch {
        event: String,
        expected: String,
        got: usize,
    },

    #[error("Event '{event}': ABI decode failed: {reason}")]
    AbiDecodeFailed { event: String, reason: String },

    #[error("Unsupported ABI type: {ty}")]
    UnsupportedType { ty: String },

    #[error("Invalid hex: {reason}")]
    InvalidHex { reason: String },

    #[error("Invalid ABI: {reason}")]
    InvalidAbi { reason: String },

    #[error("Record {transaction_id}#{log_index} carries neither topics nor decoded values")]
    EmptyRecord {
        transaction_id: String,
        log_index: u32,
    },
}

/// Errors surfaced by sources and by the query / watch layers.
#[derive(Debug, Clone, Error)]
pub enum EventError {
    /// The backend could not be reached. Retry at a higher layer.
    #[error("{node} unavailable: {reason}")]
    Unavailable { node: ResourceNode, reason: String },

    /// The backend has no record (yet). Not necessarily terminal.
    #[error("{what} not found on {node}")]
    NotFound { node: ResourceNode, what: String },

    /// The raw log disagrees with the supplied ABI.
    #[error("Decoding error: {0}")]
    Decoding(#[from] DecodeError),

    /// The query kind is not served by this backend.
    #[error("{node} does not support {query} queries")]
    UnsupportedQuery {
        node: ResourceNode,
        query: &'static str,
    },
}

impl EventError {
    pub fn unavailable(node: ResourceNode, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            node,
            reason: reason.into(),
        }
    }

    pub fn not_found(node: ResourceNode, what: impl Into<String>) -> Self {
        Self::NotFound {
            node,
            what: what.into(),
        }
    }

    /// Returns `true` if another backend or a later poll may still succeed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the error is transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::NotFound { .. })
    }
}
