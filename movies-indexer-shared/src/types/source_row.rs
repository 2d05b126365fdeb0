//! Rows extracted from the relational catalog.
//!
//! These are ephemeral: a row lives only as long as the batch it arrived in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::entity_kind::EntityKind;
use crate::types::movie_document::GenreRef;

/// Position of a row in the `(modified, id)` ordering used for batch paging.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageKey {
    pub modified: DateTime<Utc>,
    pub id: String,
}

/// A person linked to a film work, tagged with the role they played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonLink {
    pub id: String,
    pub name: String,
    /// Raw role tag from the junction table (`director`, `actor`, `writer`, ...).
    pub role: String,
}

/// One film work joined with its rating, genres and persons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmWorkRow {
    pub id: String,
    pub rating: Option<f64>,
    pub title: String,
    pub description: Option<String>,
    /// Latest modification time across the film work and everything it references.
    pub modified: DateTime<Utc>,
    pub genres: Vec<GenreRef>,
    pub persons: Vec<PersonLink>,
}

/// One genre row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub modified: DateTime<Utc>,
}

/// A film a person took part in, with the role tag of that participation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonFilmLink {
    #[serde(rename = "id")]
    pub film_id: String,
    pub role: String,
}

/// One person row with every film participation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRow {
    pub id: String,
    pub full_name: String,
    pub modified: DateTime<Utc>,
    pub films: Vec<PersonFilmLink>,
}

/// A row of any synchronized relation.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRow {
    FilmWork(FilmWorkRow),
    Genre(GenreRow),
    Person(PersonRow),
}

impl SourceRow {
    pub fn id(&self) -> &str {
        match self {
            SourceRow::FilmWork(row) => &row.id,
            SourceRow::Genre(row) => &row.id,
            SourceRow::Person(row) => &row.id,
        }
    }

    pub fn modified(&self) -> DateTime<Utc> {
        match self {
            SourceRow::FilmWork(row) => row.modified,
            SourceRow::Genre(row) => row.modified,
            SourceRow::Person(row) => row.modified,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            SourceRow::FilmWork(_) => EntityKind::Movies,
            SourceRow::Genre(_) => EntityKind::Genres,
            SourceRow::Person(_) => EntityKind::Persons,
        }
    }

    /// The key the next page must start strictly after.
    pub fn page_key(&self) -> PageKey {
        PageKey {
            modified: self.modified(),
            id: self.id().to_string(),
        }
    }
}
