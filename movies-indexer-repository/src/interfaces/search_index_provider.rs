//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::opensearch::IndexDefinition;
use crate::types::{BatchOperationSummary, IndexStatus, UpsertDocumentRequest};

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into the loader to enable dependency injection and easy
/// testing with mock implementations.
///
/// # Note on Document Writes
///
/// There is no separate create/update: `bulk_upsert_documents` writes whole documents by
/// id, creating them if absent and replacing them otherwise. Per-document atomicity is the
/// backend's: a document is either its old or its new version, never a mix.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the index exists, creating it with `index.body` if necessary.
    ///
    /// Checks existence before creating and never alters the mapping of an
    /// existing index.
    ///
    /// # Returns
    ///
    /// * `Ok(IndexStatus)` - Whether the index was created or already existed
    /// * `Err(SearchIndexError)` - If the check or the creation fails
    async fn ensure_index_exists(
        &self,
        index: &IndexDefinition,
    ) -> Result<IndexStatus, SearchIndexError>;

    /// Upsert multiple documents with a single bulk request.
    ///
    /// # Arguments
    ///
    /// * `index` - Target index name
    /// * `requests` - Documents keyed by id
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document outcome; some items may have failed
    /// * `Err(SearchIndexError)` - If the bulk request failed as a whole
    async fn bulk_upsert_documents(
        &self,
        index: &str,
        requests: &[UpsertDocumentRequest],
    ) -> Result<BatchOperationSummary, SearchIndexError>;
}
