//! Extractor module for the movies indexer.
//!
//! Pulls rows changed since a watermark out of the catalog, one bounded batch
//! at a time.

use std::sync::Arc;

use movies_indexer_repository::MovieSource;
use movies_indexer_shared::{EntityKind, PageKey, SourceRow, Watermark};
use tracing::debug;

use crate::errors::EtlError;
use crate::retry::RetryPolicy;

/// Builds batch sequences over a [`MovieSource`].
pub struct Extractor {
    source: Arc<dyn MovieSource>,
    retry: RetryPolicy,
    batch_size: usize,
}

impl Extractor {
    /// Create a new extractor.
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn new(source: Arc<dyn MovieSource>, retry: RetryPolicy, batch_size: usize) -> Self {
        Self {
            source,
            retry,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Start a fresh batch sequence for rows of `kind` changed at or after `since`.
    ///
    /// Nothing is fetched until the first [`ChangedBatches::next_batch`] call.
    pub fn extract(&self, kind: EntityKind, since: Watermark) -> ChangedBatches {
        ChangedBatches {
            source: Arc::clone(&self.source),
            retry: self.retry,
            batch_size: self.batch_size,
            kind,
            since,
            after: None,
            fetched: 0,
            exhausted: false,
        }
    }
}

/// A finite, pull-based sequence of batches.
///
/// Each pull runs one query that resumes strictly after the last row of the
/// previous batch. The sequence ends at the first empty page.
pub struct ChangedBatches {
    source: Arc<dyn MovieSource>,
    retry: RetryPolicy,
    batch_size: usize,
    kind: EntityKind,
    since: Watermark,
    after: Option<PageKey>,
    fetched: usize,
    exhausted: bool,
}

impl ChangedBatches {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Fetch the next batch, or `None` once the sequence is exhausted.
    ///
    /// Transient source errors are retried with the extractor's policy.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<SourceRow>>, EtlError> {
        if self.exhausted {
            return Ok(None);
        }

        let kind = self.kind;
        let since = self.since;
        let limit = self.batch_size;
        let after = self.after.clone();
        let source = &self.source;

        let rows = self
            .retry
            .run("fetch_changed", || {
                let source = Arc::clone(source);
                let after = after.clone();
                async move { source.fetch_changed(kind, since, after.as_ref(), limit).await }
            })
            .await?;

        if rows.is_empty() {
            self.exhausted = true;
            debug!(kind = %kind, rows = self.fetched, "Extraction finished");
            return Ok(None);
        }

        self.fetched += rows.len();
        self.after = rows.last().map(SourceRow::page_key);
        debug!(kind = %kind, batch_rows = rows.len(), "Extracted batch");

        Ok(Some(rows))
    }
}
