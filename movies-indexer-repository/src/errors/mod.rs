//! Error types for the movies indexer repository.
//!
//! One error type per external store. Both expose `is_transient` so callers
//! can decide what is worth retrying.

mod search_index_error;
mod source_error;

pub use search_index_error::SearchIndexError;
pub use source_error::SourceError;
