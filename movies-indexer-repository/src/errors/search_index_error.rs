//! Search index error types.
//!
//! This module defines the unified error type for all search index operations,
//! split into failures worth retrying (connectivity, temporary unavailability,
//! retryable bulk item failures) and failures that need an operator.

use thiserror::Error;

/// Unified errors from search index operations.
///
/// Used by the `SearchIndexProvider` trait for every backend call.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., empty document id).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to reach the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend answered 429 or 5xx.
    #[error("Index unavailable (status {status}): {message}")]
    Unavailable { status: u16, message: String },

    /// Some documents of a bulk request failed with a retryable status.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// The backend rejected the request as a whole.
    #[error("Request error: {0}")]
    RequestError(String),

    /// Failed to parse response from search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search index backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an unavailable error for a 429/5xx answer.
    pub fn unavailable(status: u16, msg: impl Into<String>) -> Self {
        Self::Unavailable {
            status,
            message: msg.into(),
        }
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::RequestError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError(_) | Self::Unavailable { .. } | Self::BulkIndexError(_)
        )
    }

    /// Whether an HTTP status means the backend is temporarily unable to serve.
    pub fn is_retryable_status(status: u16) -> bool {
        status == 429 || (500..=599).contains(&status)
    }
}
