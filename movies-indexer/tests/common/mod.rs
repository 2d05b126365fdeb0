//! In-memory stores shared by the orchestrator integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};

use movies_indexer::errors::StateError;
use movies_indexer::extractor::Extractor;
use movies_indexer::loader::SearchLoader;
use movies_indexer::orchestrator::{Orchestrator, OrchestratorConfig};
use movies_indexer::retry::RetryPolicy;
use movies_indexer::state::StateStore;
use movies_indexer::transformer::Transformer;
use movies_indexer_repository::{
    BatchOperationResult, BatchOperationSummary, IndexConfig, IndexDefinition, IndexStatus,
    MovieSource, SearchIndexError, SearchIndexProvider, SourceError, UpsertDocumentRequest,
};
use movies_indexer_shared::{EntityKind, FilmWorkRow, PageKey, SourceRow, Watermark};

// Mock catalog for testing
pub struct MockSource {
    pub rows: Mutex<Vec<SourceRow>>,
    pub fail_with: Mutex<Option<SourceError>>,
    pub calls: AtomicUsize,
    pub entered: Notify,
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl MockSource {
    pub fn new(rows: Vec<SourceRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail_with: Mutex::new(None),
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            gate: Mutex::new(None),
        }
    }

    pub fn push(&self, row: SourceRow) {
        self.rows.lock().unwrap().push(row);
    }

    pub fn fail_with(&self, error: Option<SourceError>) {
        *self.fail_with.lock().unwrap() = error;
    }

    /// Make the next fetch wait until the returned handle is notified.
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&release));
        release
    }
}

#[async_trait]
impl MovieSource for MockSource {
    async fn fetch_changed(
        &self,
        kind: EntityKind,
        since: Watermark,
        after: Option<&PageKey>,
        limit: usize,
    ) -> Result<Vec<SourceRow>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().take();
        if let Some(release) = gate {
            self.entered.notify_one();
            release.notified().await;
        }

        if let Some(error) = self.fail_with.lock().unwrap().clone() {
            return Err(error);
        }

        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.kind() == kind)
            .filter(|row| row.modified() >= since.timestamp())
            .filter(|row| after.map_or(true, |key| &row.page_key() > key))
            .cloned()
            .collect();
        rows.sort_by_key(SourceRow::page_key);
        rows.truncate(limit);
        Ok(rows)
    }
}

// Mock Search Provider for testing
pub struct MockSearchProvider {
    pub documents: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    pub bulk_calls: AtomicUsize,
    /// Bulk calls after this many successful ones fail with a connection error.
    pub fail_after: Mutex<Option<usize>>,
    pub reject_ids: Mutex<HashSet<String>>,
    pub fail_ensure: AtomicBool,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            bulk_calls: AtomicUsize::new(0),
            fail_after: Mutex::new(None),
            reject_ids: Mutex::new(HashSet::new()),
            fail_ensure: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self, index: &str) -> BTreeMap<String, Value> {
        self.documents
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_document(&self, index: &str, id: &str) -> Option<Value> {
        self.snapshot(index).get(id).cloned()
    }

    pub fn get_indexed_count(&self, index: &str) -> usize {
        self.snapshot(index).len()
    }
}

#[async_trait]
impl SearchIndexProvider for MockSearchProvider {
    async fn ensure_index_exists(
        &self,
        index: &IndexDefinition,
    ) -> Result<IndexStatus, SearchIndexError> {
        if self.fail_ensure.load(Ordering::SeqCst) {
            return Err(SearchIndexError::index_creation("mapper_parsing_exception"));
        }

        let mut documents = self.documents.lock().unwrap();
        if documents.contains_key(&index.name) {
            return Ok(IndexStatus::AlreadyExists);
        }
        documents.insert(index.name.clone(), BTreeMap::new());
        Ok(IndexStatus::Created)
    }

    async fn bulk_upsert_documents(
        &self,
        index: &str,
        requests: &[UpsertDocumentRequest],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let previous_calls = self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.fail_after.lock().unwrap() {
            if previous_calls >= limit {
                return Err(SearchIndexError::connection("connection refused"));
            }
        }

        let reject_ids = self.reject_ids.lock().unwrap().clone();
        let mut documents = self.documents.lock().unwrap();
        let target = documents.entry(index.to_string()).or_default();

        let results = requests
            .iter()
            .map(|request| {
                if reject_ids.contains(&request.document_id) {
                    BatchOperationResult::failed(
                        request.document_id.clone(),
                        Some(400),
                        "mapper_parsing_exception: failed to parse",
                    )
                } else {
                    target.insert(request.document_id.clone(), request.body.clone());
                    BatchOperationResult::succeeded(request.document_id.clone(), Some(200))
                }
            })
            .collect();

        Ok(BatchOperationSummary::from_results(results))
    }
}

// Mock watermark store for testing
pub struct MockState {
    pub current: Mutex<Option<Watermark>>,
    pub history: Mutex<Vec<Watermark>>,
    pub fail_get: AtomicBool,
}

impl MockState {
    pub fn new(initial: Option<Watermark>) -> Self {
        Self {
            current: Mutex::new(initial),
            history: Mutex::new(Vec::new()),
            fail_get: AtomicBool::new(false),
        }
    }

    pub fn current(&self) -> Option<Watermark> {
        *self.current.lock().unwrap()
    }

    pub fn reset(&self, watermark: Option<Watermark>) {
        *self.current.lock().unwrap() = watermark;
    }

    pub fn get_set_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

#[async_trait]
impl StateStore for MockState {
    async fn get(&self) -> Result<Watermark, StateError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StateError::io("permission denied"));
        }
        Ok(self.current().unwrap_or_default())
    }

    async fn set(&self, watermark: Watermark) -> Result<(), StateError> {
        *self.current.lock().unwrap() = Some(watermark);
        self.history.lock().unwrap().push(watermark);
        Ok(())
    }
}

pub struct Harness {
    pub source: Arc<MockSource>,
    pub index: Arc<MockSearchProvider>,
    pub state: Arc<MockState>,
}

impl Harness {
    pub fn new(rows: Vec<SourceRow>, watermark: Option<Watermark>) -> Self {
        Self {
            source: Arc::new(MockSource::new(rows)),
            index: Arc::new(MockSearchProvider::new()),
            state: Arc::new(MockState::new(watermark)),
        }
    }

    pub fn orchestrator(&self, batch_size: usize, poll_interval: Duration) -> Orchestrator {
        let retry = RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(2), 2);
        Orchestrator::new(
            Extractor::new(self.source.clone(), retry, batch_size),
            Transformer::new(),
            SearchLoader::new(self.index.clone(), IndexConfig::default(), retry),
            self.state.clone(),
            OrchestratorConfig {
                poll_interval,
                kinds: EntityKind::ALL.to_vec(),
            },
        )
    }
}

pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::minutes(minutes)
}

pub fn film(id: &str, modified: DateTime<Utc>) -> SourceRow {
    SourceRow::FilmWork(FilmWorkRow {
        id: id.to_string(),
        rating: Some(7.0),
        title: format!("Film {}", id),
        description: None,
        modified,
        genres: Vec::new(),
        persons: Vec::new(),
    })
}

pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub const HOUR: Duration = Duration::from_secs(3600);
