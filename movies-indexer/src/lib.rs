//! # Movies Indexer
//!
//! Keeps the OpenSearch `movies`, `genres` and `persons` indices in sync with
//! the PostgreSQL movie catalog.
//!
//! ## Architecture
//!
//! The indexer follows the Extractor-Transformer-Loader pattern:
//!
//! 1. **Extractor**: Pages through catalog rows changed since the watermark
//! 2. **Transformer**: Turns rows into denormalized search documents
//! 3. **Loader**: Bulk-upserts documents into the search index
//! 4. **Orchestrator**: Runs cycles on an interval or on change signals and
//!    checkpoints the watermark
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`extractor`]: Batched change extraction
//! - [`transformer`]: Rows to documents
//! - [`loader`]: Index provisioning and bulk upserts
//! - [`orchestrator`]: Cycle scheduling and checkpointing
//! - [`listener`]: PostgreSQL `LISTEN` change signals
//! - [`retry`]: Exponential backoff around store calls
//! - [`state`]: Watermark persistence
//! - [`errors`]: Error types for the pipeline

pub mod config;
pub mod errors;
pub mod extractor;
pub mod listener;
pub mod loader;
pub mod orchestrator;
pub mod retry;
pub mod state;
pub mod transformer;

pub use config::{Dependencies, Settings};
pub use errors::EtlError;

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    EtlError(#[from] EtlError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
