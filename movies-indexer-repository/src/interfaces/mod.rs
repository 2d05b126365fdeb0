//! Interface definitions for the external stores.
//!
//! This module defines the abstract traits that allow for dependency injection
//! and swappable implementations of the relational source and the search index.

mod movie_source;
mod search_index_provider;

pub use movie_source::MovieSource;
pub use search_index_provider::SearchIndexProvider;
