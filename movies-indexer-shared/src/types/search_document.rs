//! The union of all documents the pipeline writes.

use serde::Serialize;

use crate::types::entity_kind::EntityKind;
use crate::types::genre_document::GenreDocument;
use crate::types::movie_document::MovieDocument;
use crate::types::person_document::PersonDocument;

/// A document ready to be upserted into the index of its [`EntityKind`].
///
/// Serializes as the bare inner document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchDocument {
    Movie(MovieDocument),
    Genre(GenreDocument),
    Person(PersonDocument),
}

impl SearchDocument {
    /// The index document id, equal to the source row id.
    pub fn document_id(&self) -> &str {
        match self {
            SearchDocument::Movie(doc) => &doc.id,
            SearchDocument::Genre(doc) => &doc.id,
            SearchDocument::Person(doc) => &doc.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            SearchDocument::Movie(_) => EntityKind::Movies,
            SearchDocument::Genre(_) => EntityKind::Genres,
            SearchDocument::Person(_) => EntityKind::Persons,
        }
    }
}
