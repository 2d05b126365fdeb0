//! Person document for the persons index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A film in a person's filmography with every role they had in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFilm {
    pub id: String,
    pub roles: Vec<String>,
}

/// Document representation of a person in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDocument {
    pub id: String,
    pub full_name: String,
    pub films: Vec<PersonFilm>,
    pub modified: DateTime<Utc>,
}
