//! Loader module for the movies indexer.
//!
//! Provisions the target indices and bulk-upserts documents into them.

use std::sync::Arc;

use movies_indexer_repository::{
    BatchOperationSummary, IndexConfig, SearchIndexError, SearchIndexProvider,
    UpsertDocumentRequest,
};
use movies_indexer_shared::{EntityKind, SearchDocument};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::EtlError;
use crate::retry::RetryPolicy;

/// Outcome of loading one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Documents the index accepted.
    pub indexed: usize,
    /// Documents the index refused because of their content.
    pub rejected: usize,
}

impl LoadReport {
    fn merge(&mut self, other: LoadReport) {
        self.indexed += other.indexed;
        self.rejected += other.rejected;
    }
}

/// Loader that indexes documents into the search engine.
///
/// The loader is responsible for:
/// - Creating missing indices with their mappings
/// - Sending each batch as one bulk request per target index
/// - Retrying the whole request while any item failed with a retryable status
/// - Logging items the index rejected, without retrying them
pub struct SearchLoader {
    provider: Arc<dyn SearchIndexProvider>,
    indices: IndexConfig,
    retry: RetryPolicy,
}

impl SearchLoader {
    /// Create a new search loader with the given provider.
    pub fn new(provider: Arc<dyn SearchIndexProvider>, indices: IndexConfig, retry: RetryPolicy) -> Self {
        Self {
            provider,
            indices,
            retry,
        }
    }

    /// Make sure the index of every kind exists.
    ///
    /// Existing indices are left untouched.
    #[instrument(skip(self))]
    pub async fn ensure_indices(&self, kinds: &[EntityKind]) -> Result<(), EtlError> {
        for kind in kinds {
            let definition = self.indices.definition(*kind);
            let provider = &self.provider;

            let status = self
                .retry
                .run("ensure_index_exists", || {
                    let provider = Arc::clone(provider);
                    let definition = definition.clone();
                    async move { provider.ensure_index_exists(&definition).await }
                })
                .await?;

            info!(kind = %kind, index = %definition.name, status = ?status, "Index ready");
        }
        Ok(())
    }

    /// Upsert a batch of documents.
    ///
    /// Documents are grouped by target index and each group goes out as a
    /// single bulk request.
    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    pub async fn load(&self, documents: &[SearchDocument]) -> Result<LoadReport, EtlError> {
        let mut report = LoadReport::default();

        for kind in EntityKind::ALL {
            let requests = documents
                .iter()
                .filter(|doc| doc.kind() == kind)
                .map(Self::to_request)
                .collect::<Result<Vec<_>, _>>()?;

            if requests.is_empty() {
                continue;
            }

            let index = self.indices.index_name(kind);
            report.merge(self.bulk_upsert(index, requests).await?);
        }

        Ok(report)
    }

    fn to_request(document: &SearchDocument) -> Result<UpsertDocumentRequest, EtlError> {
        let body = serde_json::to_value(document).map_err(|e| {
            EtlError::serialization(format!(
                "failed to serialize document {}: {}",
                document.document_id(),
                e
            ))
        })?;

        Ok(UpsertDocumentRequest {
            document_id: document.document_id().to_string(),
            body,
        })
    }

    async fn bulk_upsert(
        &self,
        index: &str,
        requests: Vec<UpsertDocumentRequest>,
    ) -> Result<LoadReport, EtlError> {
        let count = requests.len();
        let requests = Arc::new(requests);
        let provider = &self.provider;

        let summary = self
            .retry
            .run("bulk_upsert_documents", || {
                let provider = Arc::clone(provider);
                let requests = Arc::clone(&requests);
                let index = index.to_string();
                async move {
                    let summary = provider.bulk_upsert_documents(&index, &requests).await?;
                    Self::check_partial_failure(&index, summary)
                }
            })
            .await
            .map_err(|e| {
                error!(index = %index, count = count, error = %e, "Failed to bulk upsert documents");
                e
            })?;

        let mut rejected = 0;
        for result in summary.rejected() {
            rejected += 1;
            error!(
                index = %index,
                document_id = %result.document_id,
                status = ?result.status,
                error = result.error.as_deref().unwrap_or("unknown"),
                "Document rejected by the search index"
            );
        }

        debug!(
            index = %index,
            indexed = summary.succeeded,
            rejected = rejected,
            "Bulk upsert completed"
        );

        Ok(LoadReport {
            indexed: summary.succeeded,
            rejected,
        })
    }

    /// Turn a summary with retryable item failures into a transient error so
    /// the whole request is sent again.
    fn check_partial_failure(
        index: &str,
        summary: BatchOperationSummary,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if !summary.has_retryable_failures() {
            return Ok(summary);
        }

        let retryable = summary.retryable_failures().count();
        warn!(
            index = %index,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            retryable = retryable,
            "Bulk upsert completed with some failures"
        );

        Err(SearchIndexError::bulk_index(format!(
            "{} of {} documents failed with a retryable status",
            retryable, summary.total
        )))
    }
}
