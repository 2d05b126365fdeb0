//! Change queries against the `content` schema.
//!
//! Bind order is the same for all three:
//! `$1` watermark, `$2`/`$3` page key (both NULL for the first page), `$4` limit.

/// Film works that changed themselves, or whose linked persons or genres changed.
///
/// `modified` is the latest timestamp across the film work and everything it
/// references, so a renamed person moves every film they appear in past the
/// watermark. The page is cut on film ids first; only its films are aggregated.
pub(crate) const CHANGED_FILM_WORKS: &str = r#"
WITH changed (id, modified) AS (
    SELECT fw.id, fw.modified
    FROM content.film_work fw
    WHERE fw.modified >= $1
    UNION ALL
    SELECT pfw.film_work_id, p.modified
    FROM content.person_film_work pfw
    JOIN content.person p ON p.id = pfw.person_id
    WHERE p.modified >= $1
    UNION ALL
    SELECT gfw.film_work_id, g.modified
    FROM content.genre_film_work gfw
    JOIN content.genre g ON g.id = gfw.genre_id
    WHERE g.modified >= $1
),
page AS (
    SELECT c.id, MAX(c.modified) AS last_modified
    FROM changed c
    GROUP BY c.id
    HAVING $2::timestamptz IS NULL
        OR (MAX(c.modified), c.id::text) > ($2::timestamptz, $3::text)
    ORDER BY MAX(c.modified), c.id::text
    LIMIT $4
)
SELECT
    fw.id::text AS id,
    fw.rating::float8 AS rating,
    fw.title,
    fw.description,
    pg.last_modified AS modified,
    COALESCE(
        json_agg(DISTINCT jsonb_build_object('id', g.id::text, 'name', g.name))
            FILTER (WHERE g.id IS NOT NULL),
        '[]'
    ) AS genres,
    COALESCE(
        json_agg(DISTINCT jsonb_build_object(
            'id', p.id::text,
            'name', p.full_name,
            'role', pfw.role
        )) FILTER (WHERE p.id IS NOT NULL),
        '[]'
    ) AS persons
FROM page pg
JOIN content.film_work fw ON fw.id = pg.id
LEFT JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id
LEFT JOIN content.person p ON p.id = pfw.person_id
LEFT JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id
LEFT JOIN content.genre g ON g.id = gfw.genre_id
GROUP BY fw.id, pg.last_modified
ORDER BY pg.last_modified, fw.id::text
"#;

pub(crate) const CHANGED_GENRES: &str = r#"
SELECT g.id::text AS id, g.name, g.description, g.modified
FROM content.genre g
WHERE g.modified >= $1
  AND ($2::timestamptz IS NULL OR (g.modified, g.id::text) > ($2::timestamptz, $3::text))
ORDER BY g.modified, g.id::text
LIMIT $4
"#;

/// Persons with every `(film, role)` participation.
pub(crate) const CHANGED_PERSONS: &str = r#"
SELECT
    p.id::text AS id,
    p.full_name,
    p.modified,
    COALESCE(
        json_agg(
            json_build_object('id', pfw.film_work_id::text, 'role', pfw.role)
            ORDER BY pfw.film_work_id, pfw.role
        ) FILTER (WHERE pfw.film_work_id IS NOT NULL),
        '[]'
    ) AS films
FROM content.person p
LEFT JOIN content.person_film_work pfw ON pfw.person_id = p.id
WHERE p.modified >= $1
  AND ($2::timestamptz IS NULL OR (p.modified, p.id::text) > ($2::timestamptz, $3::text))
GROUP BY p.id
ORDER BY p.modified, p.id::text
LIMIT $4
"#;
