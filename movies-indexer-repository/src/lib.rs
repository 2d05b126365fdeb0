//! # Movies Indexer Repository
//!
//! This crate provides traits and implementations for the two external stores
//! the movies indexer talks to: the relational catalog it reads changes from
//! (PostgreSQL) and the search index it writes documents to (OpenSearch).

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod types;

pub use errors::{SearchIndexError, SourceError};
pub use interfaces::{MovieSource, SearchIndexProvider};
pub use opensearch::{IndexConfig, IndexDefinition, OpenSearchProvider};
pub use postgres::PostgresMovieSource;
pub use types::{BatchOperationResult, BatchOperationSummary, IndexStatus, UpsertDocumentRequest};
