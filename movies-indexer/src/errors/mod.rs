//! Error types for the movies indexer pipeline.

use movies_indexer_repository::{SearchIndexError, SourceError};
use thiserror::Error;

/// Errors from reading or writing the persisted watermark.
///
/// Always fatal to the current cycle: the pipeline never guesses a watermark.
#[derive(Error, Debug, Clone)]
pub enum StateError {
    /// The state file could not be read or written.
    #[error("State I/O error: {0}")]
    IoError(String),

    /// The state file exists but does not hold a valid record.
    #[error("Corrupt state: {0}")]
    CorruptError(String),
}

impl StateError {
    /// Create an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Create a corrupt-state error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptError(msg.into())
    }
}

/// Errors that can occur while running a sync cycle.
#[derive(Error, Debug, Clone)]
pub enum EtlError {
    /// Error from the relational catalog.
    #[error("Source error: {0}")]
    SourceError(#[from] SourceError),

    /// Error from the search index.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] SearchIndexError),

    /// Error from the watermark store.
    #[error("State error: {0}")]
    StateError(#[from] StateError),

    /// Invalid configuration detected at run time.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A document could not be turned into JSON.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EtlError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Whether the failing operation may succeed if repeated.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::SourceError(e) => e.is_transient(),
            Self::SearchIndexError(e) => e.is_transient(),
            Self::StateError(_) | Self::ConfigError(_) | Self::SerializationError(_) => false,
        }
    }

    /// Whether the error needs an operator and should stop the process.
    ///
    /// Transient errors and state errors only abort the current cycle.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::StateError(_) => false,
            other => !other.is_transient(),
        }
    }
}
