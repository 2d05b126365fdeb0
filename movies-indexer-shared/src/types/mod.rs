//! Core data structures of the movies indexer.
//!
//! Source rows flow in from the relational store, search documents flow out
//! to the index, and the watermark records how far the pipeline has come.

pub mod entity_kind;
pub mod genre_document;
pub mod movie_document;
pub mod person_document;
pub mod search_document;
pub mod source_row;
pub mod watermark;
