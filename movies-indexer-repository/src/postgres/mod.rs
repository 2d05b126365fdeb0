//! PostgreSQL implementation of the movie catalog source.
//!
//! Reads the `content` schema: `film_work`, `genre`, `person` and the
//! `genre_film_work` / `person_film_work` junction tables. Every query pages
//! by `(modified, id)` so that each batch is a self-contained statement.

mod queries;
mod source;

pub use source::PostgresMovieSource;
