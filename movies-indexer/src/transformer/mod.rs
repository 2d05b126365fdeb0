//! Transformer module for the movies indexer.
//!
//! Turns relational rows into search documents. Pure: no I/O and no shared
//! state, so batches can be transformed independently and in any order.

use movies_indexer_shared::{
    FilmWorkRow, GenreDocument, GenreRow, MovieDocument, PersonDocument, PersonFilm, PersonRef,
    PersonRole, PersonRow, SearchDocument, SourceRow,
};
use tracing::{instrument, warn};

/// Transformer that converts catalog rows into search documents.
///
/// The transformer is responsible for:
/// - Partitioning a film's persons into director, actor and writer buckets
/// - Flattening genres into a name list next to the `{id, name}` list
/// - Normalizing a missing description to an empty string
/// - Grouping a person's roles per film
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer;

impl Transformer {
    /// Create a new transformer.
    pub fn new() -> Self {
        Self
    }

    /// Transform a batch of rows, one document per row, in row order.
    #[instrument(skip(self, rows), fields(row_count = rows.len()))]
    pub fn transform(&self, rows: &[SourceRow]) -> Vec<SearchDocument> {
        rows.iter()
            .map(|row| match row {
                SourceRow::FilmWork(film) => SearchDocument::Movie(self.transform_film_work(film)),
                SourceRow::Genre(genre) => SearchDocument::Genre(self.transform_genre(genre)),
                SourceRow::Person(person) => SearchDocument::Person(self.transform_person(person)),
            })
            .collect()
    }

    /// Build the movie document for one film work row.
    ///
    /// The rating is carried over as-is: `None` stays `None`. Persons whose
    /// role tag is not `director`, `actor` or `writer` are left out.
    pub fn transform_film_work(&self, row: &FilmWorkRow) -> MovieDocument {
        let mut doc = MovieDocument::new(row.id.clone(), row.title.clone(), row.rating, row.modified);
        doc.description = row.description.clone().unwrap_or_default();

        for genre in &row.genres {
            doc.genre.push(genre.name.clone());
            doc.genres.push(genre.clone());
        }

        for person in &row.persons {
            match PersonRole::from_tag(&person.role) {
                Some(role) => doc.push_person(
                    role,
                    PersonRef {
                        id: person.id.clone(),
                        name: person.name.clone(),
                    },
                ),
                None => warn!(
                    film_id = %row.id,
                    person_id = %person.id,
                    role = %person.role,
                    "Dropping person with unrecognized role"
                ),
            }
        }

        doc
    }

    pub fn transform_genre(&self, row: &GenreRow) -> GenreDocument {
        GenreDocument {
            id: row.id.clone(),
            name: row.name.clone(),
            description: row.description.clone().unwrap_or_default(),
            modified: row.modified,
        }
    }

    /// Build the person document, one entry per film with every distinct role
    /// in first-seen order.
    pub fn transform_person(&self, row: &PersonRow) -> PersonDocument {
        let mut films: Vec<PersonFilm> = Vec::new();

        for link in &row.films {
            match films.iter_mut().find(|film| film.id == link.film_id) {
                Some(film) => {
                    if !film.roles.contains(&link.role) {
                        film.roles.push(link.role.clone());
                    }
                }
                None => films.push(PersonFilm {
                    id: link.film_id.clone(),
                    roles: vec![link.role.clone()],
                }),
            }
        }

        PersonDocument {
            id: row.id.clone(),
            full_name: row.full_name.clone(),
            films,
            modified: row.modified,
        }
    }
}
