//! Dependency initialization and wiring for the movies indexer.

use std::sync::Arc;
use std::time::Duration;

use movies_indexer_repository::{OpenSearchProvider, PostgresMovieSource};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Settings;
use crate::extractor::Extractor;
use crate::listener::ChangeListener;
use crate::loader::SearchLoader;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::state::JsonFileStateStore;
use crate::transformer::Transformer;
use crate::IndexingError;

/// Maximum number of pooled catalog connections.
const MAX_DB_CONNECTIONS: u32 = 5;

/// How long to wait for a pooled connection before failing the query.
const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// The change listener task, when enabled.
    pub listener: Option<JoinHandle<()>>,
}

impl Dependencies {
    /// Initialize all dependencies from settings.
    ///
    /// The catalog pool connects lazily; indices are provisioned when the
    /// orchestrator starts.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If a setting cannot be turned into a client
    pub async fn new(settings: &Settings) -> Result<Self, IndexingError> {
        info!(
            database = ?settings.database,
            es_host = %settings.es_host,
            batch_size = settings.batch_size,
            poll_interval_secs = settings.poll_interval.as_secs_f64(),
            state_file = %settings.state_file_path.display(),
            listen_for_changes = settings.listen_for_changes,
            "Initializing dependencies"
        );

        let pool = PgPoolOptions::new()
            .max_connections(MAX_DB_CONNECTIONS)
            .acquire_timeout(DB_ACQUIRE_TIMEOUT)
            .connect_lazy_with(settings.database.connect_options()?);

        let search_provider = OpenSearchProvider::new(&settings.es_host)
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?;

        let retry = settings.retry_policy();
        let source = PostgresMovieSource::new(pool);
        let listener_pool = source.pool().clone();

        let extractor = Extractor::new(Arc::new(source), retry, settings.batch_size);
        let loader = SearchLoader::new(Arc::new(search_provider), settings.index_config(), retry);
        let state = Arc::new(JsonFileStateStore::new(&settings.state_file_path));

        let mut orchestrator = Orchestrator::new(
            extractor,
            Transformer::new(),
            loader,
            state,
            OrchestratorConfig {
                poll_interval: settings.poll_interval,
                kinds: settings.indexed_entities.clone(),
            },
        );

        let listener = if settings.listen_for_changes {
            // Capacity 1: at most one pending trigger, the rest coalesce.
            let (signal_tx, signal_rx) = mpsc::channel(1);
            orchestrator = orchestrator.with_change_signals(signal_rx);

            let listener = ChangeListener::new(
                listener_pool,
                settings.notify_channel.clone(),
                settings.listener_retry_interval,
                signal_tx,
            );
            let shutdown = orchestrator.shutdown_handle().subscribe();

            info!(channel = %settings.notify_channel, "Change listener enabled");
            Some(tokio::spawn(listener.run(shutdown)))
        } else {
            None
        };

        Ok(Self {
            orchestrator,
            listener,
        })
    }
}
