//! Genre document for the genres index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreDocument {
    pub id: String,
    pub name: String,
    /// Empty when the source row has no description.
    pub description: String,
    pub modified: DateTime<Utc>,
}
