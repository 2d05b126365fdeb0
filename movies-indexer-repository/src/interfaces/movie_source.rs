use async_trait::async_trait;
use movies_indexer_shared::{EntityKind, PageKey, SourceRow, Watermark};

use crate::errors::SourceError;

/// Read side of the relational catalog.
///
/// Provides a clean abstraction over the change queries so the extractor can be
/// exercised against an in-memory catalog.
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// Fetch one page of rows of `kind` changed at or after `since`.
    ///
    /// Rows are ordered by `(modified, id)` ascending. When `after` is set, only
    /// rows strictly after that key are returned. At most `limit` rows come back;
    /// an empty vector means there is nothing left.
    async fn fetch_changed(
        &self,
        kind: EntityKind,
        since: Watermark,
        after: Option<&PageKey>,
        limit: usize,
    ) -> Result<Vec<SourceRow>, SourceError>;
}
