//! Request and response types for search index operations.

use serde_json::Value;

use crate::errors::SearchIndexError;

/// Request to write a whole document under a fixed id.
///
/// Writing the same body under the same id twice leaves the index unchanged,
/// which is what makes redelivery safe.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertDocumentRequest {
    /// The index document id (the source row id).
    pub document_id: String,
    /// The full document source.
    pub body: Value,
}

/// Outcome of `ensure_index_exists`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// The index was created by this call.
    Created,
    /// The index was already there and was left untouched.
    AlreadyExists,
}

/// Result of a batch operation for a single item.
///
/// This struct represents the outcome of indexing one document within a bulk
/// request. Failed items carry the HTTP status the backend reported for them.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOperationResult {
    /// The document's id.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Per-item status reported by the backend.
    pub status: Option<u16>,
    /// Error reason if the operation failed.
    pub error: Option<String>,
}

impl BatchOperationResult {
    /// A successful item.
    pub fn succeeded(document_id: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            document_id: document_id.into(),
            success: true,
            status,
            error: None,
        }
    }

    /// A failed item.
    pub fn failed(document_id: impl Into<String>, status: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            success: false,
            status,
            error: Some(error.into()),
        }
    }

    /// Whether resending this item may succeed.
    ///
    /// Failures without a status are treated as retryable.
    pub fn is_retryable(&self) -> bool {
        !self.success
            && self
                .status
                .map(SearchIndexError::is_retryable_status)
                .unwrap_or(true)
    }

    /// Whether the backend refused this item's content (a data error).
    pub fn is_rejected(&self) -> bool {
        !self.success && !self.is_retryable()
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This struct provides a complete overview of a bulk operation, including the total
/// number of items processed, how many succeeded and failed, and detailed results for
/// each individual item. This allows callers to handle partial failures gracefully.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-item results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Items that failed with a retryable status.
    pub fn retryable_failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| r.is_retryable())
    }

    /// Items the backend refused because of their content.
    pub fn rejected(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| r.is_rejected())
    }

    pub fn has_retryable_failures(&self) -> bool {
        self.retryable_failures().next().is_some()
    }
}
