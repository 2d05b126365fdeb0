//! Movie document types for the search index.
//!
//! This module defines the denormalized movie record that readers query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A genre reference embedded in a movie document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRef {
    pub id: String,
    pub name: String,
}

/// A person reference embedded in a movie document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: String,
    pub name: String,
}

/// Role buckets a movie document partitions its persons into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonRole {
    Director,
    Actor,
    Writer,
}

impl PersonRole {
    /// Map a junction-table role tag onto a bucket.
    ///
    /// Tags are matched exactly; anything else returns `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "director" => Some(PersonRole::Director),
            "actor" => Some(PersonRole::Actor),
            "writer" => Some(PersonRole::Writer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonRole::Director => "director",
            PersonRole::Actor => "actor",
            PersonRole::Writer => "writer",
        }
    }
}

/// Document representation of a movie in the search index.
///
/// The document id equals the source film work id, so indexing the same
/// movie twice replaces the earlier version instead of duplicating it.
///
/// # Fields
///
/// - `imdb_rating`: `None` means unknown and is serialized as `null`
/// - `genre` / `genres`: flat genre names for full-text use, and `{id, name}`
///   objects for structured filtering
/// - `description`: always present, empty when the source has none
/// - `*_names` / `directors`, `actors`, `writers`: per-role flat names and
///   `{id, name}` objects
/// - `modified`: source modification timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDocument {
    pub id: String,
    pub imdb_rating: Option<f64>,
    pub genre: Vec<String>,
    pub genres: Vec<GenreRef>,
    pub title: String,
    pub description: String,
    pub directors_names: Vec<String>,
    pub actors_names: Vec<String>,
    pub writers_names: Vec<String>,
    pub directors: Vec<PersonRef>,
    pub actors: Vec<PersonRef>,
    pub writers: Vec<PersonRef>,
    pub modified: DateTime<Utc>,
}

impl MovieDocument {
    /// Create a document with no genres or persons.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        imdb_rating: Option<f64>,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            imdb_rating,
            genre: Vec::new(),
            genres: Vec::new(),
            title: title.into(),
            description: String::new(),
            directors_names: Vec::new(),
            actors_names: Vec::new(),
            writers_names: Vec::new(),
            directors: Vec::new(),
            actors: Vec::new(),
            writers: Vec::new(),
            modified,
        }
    }

    /// Append a person to the buckets of `role`.
    pub fn push_person(&mut self, role: PersonRole, person: PersonRef) {
        let (names, details) = match role {
            PersonRole::Director => (&mut self.directors_names, &mut self.directors),
            PersonRole::Actor => (&mut self.actors_names, &mut self.actors),
            PersonRole::Writer => (&mut self.writers_names, &mut self.writers),
        };
        names.push(person.name.clone());
        details.push(person);
    }

    /// The `{id, name}` list for `role`.
    pub fn persons(&self, role: PersonRole) -> &[PersonRef] {
        match role {
            PersonRole::Director => &self.directors,
            PersonRole::Actor => &self.actors,
            PersonRole::Writer => &self.writers,
        }
    }
}
