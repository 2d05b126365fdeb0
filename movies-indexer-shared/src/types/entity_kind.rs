//! Kinds of catalog entities synchronized into the search index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A catalog relation with its own extraction query and target index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Film works joined with their genres and persons.
    Movies,
    /// Genres on their own.
    Genres,
    /// Persons with their filmography.
    Persons,
}

impl EntityKind {
    /// All kinds, in the order a cycle processes them.
    pub const ALL: [EntityKind; 3] = [EntityKind::Movies, EntityKind::Genres, EntityKind::Persons];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Movies => "movies",
            EntityKind::Genres => "genres",
            EntityKind::Persons => "persons",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name an [`EntityKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEntityKindError(pub String);

impl fmt::Display for ParseEntityKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown entity kind '{}', expected one of movies, genres, persons",
            self.0
        )
    }
}

impl std::error::Error for ParseEntityKindError {}

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movies" | "movie" | "film_work" => Ok(EntityKind::Movies),
            "genres" | "genre" => Ok(EntityKind::Genres),
            "persons" | "person" => Ok(EntityKind::Persons),
            other => Err(ParseEntityKindError(other.to_string())),
        }
    }
}
