//! Integration tests for the PostgreSQL movie source.
//!
//! These tests require a real PostgreSQL database and use SQLx test macros
//! to ensure proper test isolation and cleanup.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test --test postgres_movie_source`

use chrono::{DateTime, Duration, TimeZone, Utc};
use movies_indexer_repository::{MovieSource, PostgresMovieSource};
use movies_indexer_shared::{EntityKind, SourceRow, Watermark};
use uuid::Uuid;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap()
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

async fn insert_film(
    pool: &sqlx::PgPool,
    title: &str,
    rating: Option<f64>,
    modified: DateTime<Utc>,
) -> String {
    let id = new_id();
    sqlx::query(
        "INSERT INTO content.film_work (id, title, rating, modified) VALUES ($1::uuid, $2, $3, $4)",
    )
    .bind(&id)
    .bind(title)
    .bind(rating)
    .bind(modified)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn insert_genre(pool: &sqlx::PgPool, name: &str, modified: DateTime<Utc>) -> String {
    let id = new_id();
    sqlx::query("INSERT INTO content.genre (id, name, modified) VALUES ($1::uuid, $2, $3)")
        .bind(&id)
        .bind(name)
        .bind(modified)
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn insert_person(pool: &sqlx::PgPool, full_name: &str, modified: DateTime<Utc>) -> String {
    let id = new_id();
    sqlx::query("INSERT INTO content.person (id, full_name, modified) VALUES ($1::uuid, $2, $3)")
        .bind(&id)
        .bind(full_name)
        .bind(modified)
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn link_genre(pool: &sqlx::PgPool, film_id: &str, genre_id: &str) {
    sqlx::query(
        "INSERT INTO content.genre_film_work (id, film_work_id, genre_id) VALUES ($1::uuid, $2::uuid, $3::uuid)",
    )
    .bind(new_id())
    .bind(film_id)
    .bind(genre_id)
    .execute(pool)
    .await
    .unwrap();
}

async fn link_person(pool: &sqlx::PgPool, film_id: &str, person_id: &str, role: &str) {
    sqlx::query(
        "INSERT INTO content.person_film_work (id, film_work_id, person_id, role) VALUES ($1::uuid, $2::uuid, $3::uuid, $4)",
    )
    .bind(new_id())
    .bind(film_id)
    .bind(person_id)
    .bind(role)
    .execute(pool)
    .await
    .unwrap();
}

fn film(row: &SourceRow) -> &movies_indexer_shared::FilmWorkRow {
    match row {
        SourceRow::FilmWork(film) => film,
        other => panic!("expected a film work row, got {:?}", other),
    }
}

// ============================================================================
// Film Work Query Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_film_work_joins_genres_and_persons(pool: sqlx::PgPool) {
    let film_id = insert_film(&pool, "The Star", Some(8.5), at(0)).await;
    let genre_id = insert_genre(&pool, "Action", at(1)).await;
    let director = insert_person(&pool, "Ann", at(2)).await;
    let actor = insert_person(&pool, "Bob", at(3)).await;
    link_genre(&pool, &film_id, &genre_id).await;
    link_person(&pool, &film_id, &director, "director").await;
    link_person(&pool, &film_id, &actor, "actor").await;

    let source = PostgresMovieSource::new(pool);
    let rows = source
        .fetch_changed(EntityKind::Movies, Watermark::beginning(), None, 100)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = film(&rows[0]);
    assert_eq!(row.id, film_id);
    assert_eq!(row.title, "The Star");
    assert_eq!(row.rating, Some(8.5));
    assert_eq!(row.description, None);
    // Latest timestamp across the film and what it references.
    assert_eq!(row.modified, at(3));
    assert_eq!(row.genres.len(), 1);
    assert_eq!(row.genres[0].name, "Action");

    let mut roles: Vec<_> = row
        .persons
        .iter()
        .map(|p| (p.name.as_str(), p.role.as_str()))
        .collect();
    roles.sort();
    assert_eq!(roles, vec![("Ann", "director"), ("Bob", "actor")]);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_film_work_without_links(pool: sqlx::PgPool) {
    insert_film(&pool, "Lonely", None, at(0)).await;

    let source = PostgresMovieSource::new(pool);
    let rows = source
        .fetch_changed(EntityKind::Movies, Watermark::beginning(), None, 100)
        .await
        .unwrap();

    let row = film(&rows[0]);
    assert_eq!(row.rating, None);
    assert!(row.genres.is_empty());
    assert!(row.persons.is_empty());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_person_change_propagates_to_film(pool: sqlx::PgPool) {
    let film_id = insert_film(&pool, "Old Film", Some(7.0), at(0)).await;
    let untouched = insert_film(&pool, "Untouched", Some(6.0), at(0)).await;
    let person_id = insert_person(&pool, "Carol", at(0)).await;
    link_person(&pool, &film_id, &person_id, "writer").await;

    sqlx::query("UPDATE content.person SET full_name = 'Caroline', modified = $2 WHERE id = $1::uuid")
        .bind(&person_id)
        .bind(at(30))
        .execute(&pool)
        .await
        .unwrap();

    let source = PostgresMovieSource::new(pool);
    let rows = source
        .fetch_changed(EntityKind::Movies, Watermark::new(at(10)), None, 100)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = film(&rows[0]);
    assert_eq!(row.id, film_id);
    assert_ne!(row.id, untouched);
    assert_eq!(row.persons[0].name, "Caroline");
    assert_eq!(row.modified, at(30));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_genre_change_propagates_to_film(pool: sqlx::PgPool) {
    let film_id = insert_film(&pool, "Quiet Film", Some(7.5), at(0)).await;
    let untouched = insert_film(&pool, "Untouched", Some(6.0), at(0)).await;
    let genre_id = insert_genre(&pool, "Drama", at(0)).await;
    let other_genre = insert_genre(&pool, "Comedy", at(0)).await;
    link_genre(&pool, &film_id, &genre_id).await;
    link_genre(&pool, &untouched, &other_genre).await;

    sqlx::query("UPDATE content.genre SET name = 'Melodrama', modified = $2 WHERE id = $1::uuid")
        .bind(&genre_id)
        .bind(at(30))
        .execute(&pool)
        .await
        .unwrap();

    let source = PostgresMovieSource::new(pool);
    let rows = source
        .fetch_changed(EntityKind::Movies, Watermark::new(at(10)), None, 100)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = film(&rows[0]);
    assert_eq!(row.id, film_id);
    assert_eq!(row.genres.len(), 1);
    assert_eq!(row.genres[0].name, "Melodrama");
    assert_eq!(row.modified, at(30));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_pages_follow_linked_modification_times(pool: sqlx::PgPool) {
    // Film order by own timestamp is A, B, C; linked persons reorder them to C, A, B.
    let a = insert_film(&pool, "A", None, at(1)).await;
    let b = insert_film(&pool, "B", None, at(2)).await;
    let c = insert_film(&pool, "C", None, at(3)).await;
    let early = insert_person(&pool, "Early", at(0)).await;
    let late = insert_person(&pool, "Late", at(20)).await;
    let latest = insert_person(&pool, "Latest", at(30)).await;
    for film_id in [&a, &b, &c] {
        link_person(&pool, film_id, &early, "actor").await;
    }
    link_person(&pool, &a, &late, "director").await;
    link_person(&pool, &b, &latest, "writer").await;

    let source = PostgresMovieSource::new(pool);
    let mut pages = Vec::new();
    let mut after = None;
    loop {
        let rows = source
            .fetch_changed(EntityKind::Movies, Watermark::new(at(1)), after.as_ref(), 1)
            .await
            .unwrap();
        if rows.is_empty() {
            break;
        }
        assert_eq!(rows.len(), 1);
        after = rows.last().map(SourceRow::page_key);
        pages.push(film(&rows[0]).clone());
    }

    let order: Vec<_> = pages.iter().map(|row| row.id.clone()).collect();
    assert_eq!(order, vec![c.clone(), a.clone(), b.clone()]);
    assert_eq!(
        pages.iter().map(|row| row.modified).collect::<Vec<_>>(),
        vec![at(3), at(20), at(30)]
    );
    // Each page carries the full cast, not only the changed links.
    assert_eq!(pages[0].persons.len(), 1);
    assert_eq!(pages[1].persons.len(), 2);
    assert_eq!(pages[2].persons.len(), 2);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_watermark_is_inclusive(pool: sqlx::PgPool) {
    insert_film(&pool, "Edge", None, at(5)).await;
    insert_film(&pool, "Before", None, at(4)).await;

    let source = PostgresMovieSource::new(pool);
    let rows = source
        .fetch_changed(EntityKind::Movies, Watermark::new(at(5)), None, 100)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(film(&rows[0]).title, "Edge");
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_keyset_paging_covers_every_row_once(pool: sqlx::PgPool) {
    // Same timestamp for all rows: only the id breaks the tie.
    for title in ["A", "B", "C", "D", "E"] {
        insert_film(&pool, title, None, at(0)).await;
    }

    let source = PostgresMovieSource::new(pool);
    let mut seen = Vec::new();
    let mut after = None;
    let mut pages = 0;

    loop {
        let rows = source
            .fetch_changed(EntityKind::Movies, Watermark::beginning(), after.as_ref(), 2)
            .await
            .unwrap();
        if rows.is_empty() {
            break;
        }
        assert!(rows.len() <= 2);
        pages += 1;
        after = rows.last().map(SourceRow::page_key);
        seen.extend(rows.iter().map(|r| r.id().to_string()));
    }

    assert_eq!(pages, 3);
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(seen.len(), 5);
    assert_eq!(unique.len(), 5);
}

// ============================================================================
// Genre and Person Query Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_genres_since_watermark(pool: sqlx::PgPool) {
    insert_genre(&pool, "Drama", at(1)).await;
    insert_genre(&pool, "Comedy", at(20)).await;

    let source = PostgresMovieSource::new(pool);
    let rows = source
        .fetch_changed(EntityKind::Genres, Watermark::new(at(10)), None, 100)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    match &rows[0] {
        SourceRow::Genre(genre) => {
            assert_eq!(genre.name, "Comedy");
            assert_eq!(genre.description, None);
            assert_eq!(genre.modified, at(20));
        }
        other => panic!("expected a genre row, got {:?}", other),
    }
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_person_rows_carry_every_participation(pool: sqlx::PgPool) {
    let first = insert_film(&pool, "First", None, at(0)).await;
    let second = insert_film(&pool, "Second", None, at(0)).await;
    let person_id = insert_person(&pool, "Dana", at(0) + Duration::minutes(1)).await;
    link_person(&pool, &first, &person_id, "actor").await;
    link_person(&pool, &first, &person_id, "director").await;
    link_person(&pool, &second, &person_id, "actor").await;
    insert_person(&pool, "Nobody", at(2)).await;

    let source = PostgresMovieSource::new(pool);
    let rows = source
        .fetch_changed(EntityKind::Persons, Watermark::beginning(), None, 100)
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    match &rows[0] {
        SourceRow::Person(person) => {
            assert_eq!(person.full_name, "Dana");
            assert_eq!(person.films.len(), 3);
            assert_eq!(
                person.films.iter().filter(|f| f.film_id == first).count(),
                2
            );
        }
        other => panic!("expected a person row, got {:?}", other),
    }
    match &rows[1] {
        SourceRow::Person(person) => assert!(person.films.is_empty()),
        other => panic!("expected a person row, got {:?}", other),
    }
}
