//! PostgreSQL-backed movie source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use movies_indexer_shared::{
    EntityKind, FilmWorkRow, GenreRef, GenreRow, PageKey, PersonFilmLink, PersonLink, PersonRow,
    SourceRow, Watermark,
};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;
use tracing::debug;

use crate::errors::SourceError;
use crate::interfaces::MovieSource;
use crate::postgres::queries::{CHANGED_FILM_WORKS, CHANGED_GENRES, CHANGED_PERSONS};

/// Reads changed catalog rows through a shared connection pool.
///
/// Each call to [`MovieSource::fetch_changed`] is one independent statement,
/// so a failed page can be retried on its own.
pub struct PostgresMovieSource {
    /// PostgreSQL connection pool
    pool: sqlx::PgPool,
}

impl PostgresMovieSource {
    /// Creates a new source over an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with the `content` schema
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, shared with the change listener.
    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

fn film_work_from_row(row: &PgRow) -> Result<SourceRow, SourceError> {
    let Json(genres): Json<Vec<GenreRef>> = row.try_get("genres")?;
    let Json(persons): Json<Vec<PersonLink>> = row.try_get("persons")?;

    Ok(SourceRow::FilmWork(FilmWorkRow {
        id: row.try_get("id")?,
        rating: row.try_get("rating")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        modified: row.try_get("modified")?,
        genres,
        persons,
    }))
}

fn genre_from_row(row: &PgRow) -> Result<SourceRow, SourceError> {
    Ok(SourceRow::Genre(GenreRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        modified: row.try_get("modified")?,
    }))
}

fn person_from_row(row: &PgRow) -> Result<SourceRow, SourceError> {
    let Json(films): Json<Vec<PersonFilmLink>> = row.try_get("films")?;

    Ok(SourceRow::Person(PersonRow {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        modified: row.try_get("modified")?,
        films,
    }))
}

#[async_trait]
impl MovieSource for PostgresMovieSource {
    async fn fetch_changed(
        &self,
        kind: EntityKind,
        since: Watermark,
        after: Option<&PageKey>,
        limit: usize,
    ) -> Result<Vec<SourceRow>, SourceError> {
        let (query, decode): (&str, fn(&PgRow) -> Result<SourceRow, SourceError>) = match kind {
            EntityKind::Movies => (CHANGED_FILM_WORKS, film_work_from_row),
            EntityKind::Genres => (CHANGED_GENRES, genre_from_row),
            EntityKind::Persons => (CHANGED_PERSONS, person_from_row),
        };

        let after_modified: Option<DateTime<Utc>> = after.map(|key| key.modified);
        let after_id: Option<String> = after.map(|key| key.id.clone());
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query(query)
            .bind(since.timestamp())
            .bind(after_modified)
            .bind(after_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(kind = %kind, since = %since, rows = rows.len(), "Fetched changed rows");

        rows.iter().map(decode).collect()
    }
}
