//! Settings read from the environment.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use movies_indexer_repository::IndexConfig;
use movies_indexer_shared::EntityKind;
use sqlx::postgres::PgConnectOptions;

use crate::retry::RetryPolicy;
use crate::IndexingError;

const DEFAULT_POSTGRES_DB: &str = "db";
const DEFAULT_POSTGRES_USER: &str = "postgres";
const DEFAULT_POSTGRES_PASSWORD: &str = "pwtest";
const DEFAULT_DB_HOST: &str = "127.0.0.1";
const DEFAULT_DB_PORT: u16 = 5432;

/// Default search index URL.
const DEFAULT_ES_HOST: &str = "http://127.0.0.1:9200";

const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_SLEEP_TIME_SECS: f64 = 10.0;
const DEFAULT_BACKOFF_BASE_MS: u64 = 100;
const DEFAULT_BACKOFF_CAP_MS: u64 = 10_000;
const DEFAULT_BACKOFF_MAX_ATTEMPTS: usize = 5;
const DEFAULT_STATE_FILE_PATH: &str = "data.json";
const DEFAULT_NOTIFY_CHANNEL: &str = "genre_changes";
const DEFAULT_LISTENER_RETRY_INTERVAL_SECS: u64 = 15;

/// How to reach the catalog database.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseSettings {
    /// A full connection URL (`DATABASE_URL`).
    Url(String),
    /// Individual connection parameters.
    Parts {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
}

impl DatabaseSettings {
    /// Connection options for `sqlx`.
    pub fn connect_options(&self) -> Result<PgConnectOptions, IndexingError> {
        match self {
            Self::Url(url) => url
                .parse::<PgConnectOptions>()
                .map_err(|e| IndexingError::config(format!("Invalid DATABASE_URL: {}", e))),
            Self::Parts {
                host,
                port,
                user,
                password,
                database,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(database)),
        }
    }
}

// Hand-written so the password never ends up in logs.
impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(_) => f.write_str("Url(<redacted>)"),
            Self::Parts {
                host,
                port,
                user,
                database,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("database", database)
                .finish_non_exhaustive(),
        }
    }
}

/// Everything the indexer needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub es_host: String,
    pub movies_index: String,
    pub genres_index: String,
    pub persons_index: String,
    pub batch_size: usize,
    pub poll_interval: Duration,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub backoff_max_attempts: usize,
    pub state_file_path: PathBuf,
    pub listen_for_changes: bool,
    pub notify_channel: String,
    pub listener_retry_interval: Duration,
    pub indexed_entities: Vec<EntityKind>,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: Full catalog DSN; overrides the individual parts below
    /// - `POSTGRES_DB` / `POSTGRES_USER` / `POSTGRES_PASSWORD` / `DB_HOST` / `DB_PORT`
    /// - `ES_HOST`: Search index URL (default: http://127.0.0.1:9200)
    /// - `MOVIES_INDEX` / `GENRES_INDEX` / `PERSONS_INDEX`: Index names
    /// - `BATCH_SIZE`: Rows per batch (default: 100)
    /// - `SLEEP_TIME`: Seconds between cycles, fractional allowed (default: 10.0)
    /// - `BACKOFF_BASE_MS` / `BACKOFF_CAP_MS` / `BACKOFF_MAX_ATTEMPTS`: Retry policy
    /// - `STATE_FILE_PATH`: Watermark file (default: data.json)
    /// - `LISTEN_FOR_CHANGES`: Enable the change listener (default: true)
    /// - `PG_NOTIFY_CHANNEL`: Channel to LISTEN on (default: genre_changes)
    /// - `LISTENER_RETRY_INTERVAL_SECS`: Listener reconnect delay (default: 15)
    /// - `INDEXED_ENTITIES`: Comma-separated kinds to sync (default: movies,genres,persons)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    ///
    /// Unset or blank variables take their default; set but unparsable
    /// values are configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database = match var("DATABASE_URL") {
            Some(url) => DatabaseSettings::Url(url),
            None => DatabaseSettings::Parts {
                host: var("DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
                port: parse_or(&var, "DB_PORT", DEFAULT_DB_PORT)?,
                user: var("POSTGRES_USER").unwrap_or_else(|| DEFAULT_POSTGRES_USER.to_string()),
                password: var("POSTGRES_PASSWORD")
                    .unwrap_or_else(|| DEFAULT_POSTGRES_PASSWORD.to_string()),
                database: var("POSTGRES_DB").unwrap_or_else(|| DEFAULT_POSTGRES_DB.to_string()),
            },
        };

        let batch_size: usize = parse_or(&var, "BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 {
            return Err(IndexingError::config("BATCH_SIZE must be greater than 0"));
        }

        let sleep_time: f64 = parse_or(&var, "SLEEP_TIME", DEFAULT_SLEEP_TIME_SECS)?;
        let poll_interval = Duration::try_from_secs_f64(sleep_time).map_err(|e| {
            IndexingError::config(format!("Invalid SLEEP_TIME '{}': {}", sleep_time, e))
        })?;

        let backoff_max_attempts: usize =
            parse_or(&var, "BACKOFF_MAX_ATTEMPTS", DEFAULT_BACKOFF_MAX_ATTEMPTS)?;
        if backoff_max_attempts == 0 {
            return Err(IndexingError::config(
                "BACKOFF_MAX_ATTEMPTS must be greater than 0",
            ));
        }

        let indexed_entities = match var("INDEXED_ENTITIES") {
            Some(list) => parse_entities(&list)?,
            None => EntityKind::ALL.to_vec(),
        };

        Ok(Self {
            database,
            es_host: var("ES_HOST").unwrap_or_else(|| DEFAULT_ES_HOST.to_string()),
            movies_index: var("MOVIES_INDEX").unwrap_or_else(|| "movies".to_string()),
            genres_index: var("GENRES_INDEX").unwrap_or_else(|| "genres".to_string()),
            persons_index: var("PERSONS_INDEX").unwrap_or_else(|| "persons".to_string()),
            batch_size,
            poll_interval,
            backoff_base: Duration::from_millis(parse_or(
                &var,
                "BACKOFF_BASE_MS",
                DEFAULT_BACKOFF_BASE_MS,
            )?),
            backoff_cap: Duration::from_millis(parse_or(
                &var,
                "BACKOFF_CAP_MS",
                DEFAULT_BACKOFF_CAP_MS,
            )?),
            backoff_max_attempts,
            state_file_path: PathBuf::from(
                var("STATE_FILE_PATH").unwrap_or_else(|| DEFAULT_STATE_FILE_PATH.to_string()),
            ),
            listen_for_changes: parse_bool_or(&var, "LISTEN_FOR_CHANGES", true)?,
            notify_channel: var("PG_NOTIFY_CHANNEL")
                .unwrap_or_else(|| DEFAULT_NOTIFY_CHANNEL.to_string()),
            listener_retry_interval: Duration::from_secs(parse_or(
                &var,
                "LISTENER_RETRY_INTERVAL_SECS",
                DEFAULT_LISTENER_RETRY_INTERVAL_SECS,
            )?),
            indexed_entities,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.backoff_base, self.backoff_cap, self.backoff_max_attempts)
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::new(
            self.movies_index.clone(),
            self.genres_index.clone(),
            self.persons_index.clone(),
        )
    }
}

fn parse_or<T, V>(var: &V, key: &str, default: T) -> Result<T, IndexingError>
where
    T: FromStr,
    T::Err: Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| IndexingError::config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_bool_or<V>(var: &V, key: &str, default: bool) -> Result<bool, IndexingError>
where
    V: Fn(&str) -> Option<String>,
{
    match var(key).map(|raw| raw.to_lowercase()) {
        None => Ok(default),
        Some(raw) => match raw.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(IndexingError::config(format!(
                "Invalid {} '{}': expected true or false",
                key, raw
            ))),
        },
    }
}

fn parse_entities(list: &str) -> Result<Vec<EntityKind>, IndexingError> {
    let mut kinds = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind = name
            .parse::<EntityKind>()
            .map_err(|e| IndexingError::config(format!("Invalid INDEXED_ENTITIES: {}", e)))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    if kinds.is_empty() {
        return Err(IndexingError::config("INDEXED_ENTITIES names no entity kind"));
    }

    // Always process in the canonical order.
    kinds.sort_by_key(|kind| EntityKind::ALL.iter().position(|k| k == kind));
    Ok(kinds)
}
