//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the movies, genres
//! and persons indices.

use movies_indexer_shared::EntityKind;
use serde_json::{json, Value};

/// Default index names.
pub const MOVIES_INDEX: &str = "movies";
pub const GENRES_INDEX: &str = "genres";
pub const PERSONS_INDEX: &str = "persons";

/// Name of the bilingual analyzer used by every text field.
pub const TEXT_ANALYZER: &str = "ru_en";

/// Names of the indices each entity kind is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub movies: String,
    pub genres: String,
    pub persons: String,
}

impl IndexConfig {
    /// Create a new index configuration.
    pub fn new(
        movies: impl Into<String>,
        genres: impl Into<String>,
        persons: impl Into<String>,
    ) -> Self {
        Self {
            movies: movies.into(),
            genres: genres.into(),
            persons: persons.into(),
        }
    }

    /// The index documents of `kind` are written to.
    pub fn index_name(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Movies => &self.movies,
            EntityKind::Genres => &self.genres,
            EntityKind::Persons => &self.persons,
        }
    }

    /// Name plus settings/mappings payload for the index of `kind`.
    pub fn definition(&self, kind: EntityKind) -> IndexDefinition {
        IndexDefinition {
            name: self.index_name(kind).to_string(),
            body: get_index_settings(kind),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(MOVIES_INDEX, GENRES_INDEX, PERSONS_INDEX)
    }
}

/// An index name with the body used to create it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub body: Value,
}

/// Analysis settings shared by all indices.
///
/// The `ru_en` analyzer lowercases, drops English and Russian stop words and
/// stems both languages.
fn analysis_settings() -> Value {
    json!({
        "refresh_interval": "1s",
        "analysis": {
            "filter": {
                "english_stop": { "type": "stop", "stopwords": "_english_" },
                "english_stemmer": { "type": "stemmer", "language": "english" },
                "english_possessive_stemmer": {
                    "type": "stemmer",
                    "language": "possessive_english"
                },
                "russian_stop": { "type": "stop", "stopwords": "_russian_" },
                "russian_stemmer": { "type": "stemmer", "language": "russian" }
            },
            "analyzer": {
                TEXT_ANALYZER: {
                    "tokenizer": "standard",
                    "filter": [
                        "lowercase",
                        "english_stop",
                        "english_stemmer",
                        "english_possessive_stemmer",
                        "russian_stop",
                        "russian_stemmer"
                    ]
                }
            }
        }
    })
}

fn analyzed_text() -> Value {
    json!({ "type": "text", "analyzer": TEXT_ANALYZER })
}

fn analyzed_text_with_raw() -> Value {
    json!({
        "type": "text",
        "analyzer": TEXT_ANALYZER,
        "fields": { "raw": { "type": "keyword" } }
    })
}

fn nested_reference() -> Value {
    json!({
        "type": "nested",
        "dynamic": "strict",
        "properties": {
            "id": { "type": "keyword" },
            "name": analyzed_text()
        }
    })
}

/// Get the index settings and mappings for the index of `kind`.
///
/// All mappings are `dynamic: strict`: a document carrying a field the mapping
/// does not know is rejected instead of silently widening the schema.
pub fn get_index_settings(kind: EntityKind) -> Value {
    let properties = match kind {
        EntityKind::Movies => json!({
            "id": { "type": "keyword" },
            "imdb_rating": { "type": "float" },
            "genre": { "type": "keyword" },
            "genres": nested_reference(),
            "title": analyzed_text_with_raw(),
            "description": analyzed_text(),
            "directors_names": analyzed_text(),
            "actors_names": analyzed_text(),
            "writers_names": analyzed_text(),
            "directors": nested_reference(),
            "actors": nested_reference(),
            "writers": nested_reference(),
            "modified": { "type": "date" }
        }),
        EntityKind::Genres => json!({
            "id": { "type": "keyword" },
            "name": analyzed_text_with_raw(),
            "description": analyzed_text(),
            "modified": { "type": "date" }
        }),
        EntityKind::Persons => json!({
            "id": { "type": "keyword" },
            "full_name": analyzed_text_with_raw(),
            "films": {
                "type": "nested",
                "dynamic": "strict",
                "properties": {
                    "id": { "type": "keyword" },
                    "roles": { "type": "keyword" }
                }
            },
            "modified": { "type": "date" }
        }),
    };

    json!({
        "settings": analysis_settings(),
        "mappings": {
            "dynamic": "strict",
            "properties": properties
        }
    })
}
