//! # Movies Indexer Shared
//!
//! This crate defines the data structures shared across the movies indexer:
//! rows extracted from the relational catalog, the denormalized documents
//! written to the search index, and the watermark that checkpoints progress.

pub mod types;

pub use types::entity_kind::{EntityKind, ParseEntityKindError};
pub use types::genre_document::GenreDocument;
pub use types::movie_document::{GenreRef, MovieDocument, PersonRef, PersonRole};
pub use types::person_document::{PersonDocument, PersonFilm};
pub use types::search_document::SearchDocument;
pub use types::source_row::{
    FilmWorkRow, GenreRow, PageKey, PersonFilmLink, PersonLink, PersonRow, SourceRow,
};
pub use types::watermark::Watermark;
