//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::IndexDefinition;
use crate::types::{BatchOperationResult, BatchOperationSummary, IndexStatus, UpsertDocumentRequest};

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// use movies_indexer_repository::{IndexConfig, OpenSearchProvider, SearchIndexProvider};
/// use movies_indexer_shared::EntityKind;
///
/// let provider = OpenSearchProvider::new("http://localhost:9200").await?;
/// let config = IndexConfig::default();
/// provider.ensure_index_exists(&config.definition(EntityKind::Movies)).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub async fn new(url: &str) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::validation(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch provider");

        Ok(Self { client })
    }

    /// Map a non-success HTTP answer to an error.
    ///
    /// 429 and 5xx become `Unavailable`; everything else goes through `otherwise`.
    fn status_error(
        status: u16,
        body: String,
        otherwise: fn(String) -> SearchIndexError,
    ) -> SearchIndexError {
        if SearchIndexError::is_retryable_status(status) {
            SearchIndexError::unavailable(status, body)
        } else {
            otherwise(format!("status {}: {}", status, body))
        }
    }

    /// Build the newline-delimited bulk body: one action line and one source line per document.
    fn bulk_body(requests: &[UpsertDocumentRequest]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(requests.len() * 2);
        for request in requests {
            body.push(json!({ "index": { "_id": request.document_id } }).into());
            body.push(request.body.clone().into());
        }
        body
    }

    /// Turn a bulk response into per-document results.
    ///
    /// Items come back in request order; a length mismatch means the response
    /// cannot be trusted and is reported as a parse error.
    pub(crate) fn parse_bulk_response(
        requests: &[UpsertDocumentRequest],
        response: &Value,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let items = response
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchIndexError::parse("bulk response has no items array"))?;

        if items.len() != requests.len() {
            return Err(SearchIndexError::parse(format!(
                "bulk response has {} items for {} documents",
                items.len(),
                requests.len()
            )));
        }

        let results = items
            .iter()
            .zip(requests)
            .map(|(item, request)| {
                // Each item is keyed by its action name ("index").
                let outcome = item
                    .as_object()
                    .and_then(|obj| obj.values().next())
                    .unwrap_or(&Value::Null);

                let document_id = outcome
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or(&request.document_id)
                    .to_string();
                let status = outcome
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|s| u16::try_from(s).ok());

                match outcome.get("error") {
                    Some(error) => {
                        let kind = error.get("type").and_then(Value::as_str).unwrap_or("unknown");
                        let reason = error.get("reason").and_then(Value::as_str).unwrap_or("");
                        BatchOperationResult::failed(
                            document_id,
                            status,
                            format!("{}: {}", kind, reason),
                        )
                    }
                    None => BatchOperationResult::succeeded(document_id, status),
                }
            })
            .collect();

        Ok(BatchOperationSummary::from_results(results))
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ensure_index_exists(
        &self,
        index: &IndexDefinition,
    ) -> Result<IndexStatus, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index.name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => {
                debug!(index = %index.name, "Index already exists");
                return Ok(IndexStatus::AlreadyExists);
            }
            404 => {}
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(Self::status_error(status, body, SearchIndexError::IndexCreationError));
            }
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&index.name))
            .body(index.body.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            info!(index = %index.name, "Created index");
            return Ok(IndexStatus::Created);
        }

        let body = response.text().await.unwrap_or_default();
        // Another writer created it between our check and our create.
        if status.as_u16() == 400 && body.contains("resource_already_exists_exception") {
            debug!(index = %index.name, "Index created concurrently");
            return Ok(IndexStatus::AlreadyExists);
        }

        error!(index = %index.name, status = %status, body = %body, "Index creation failed");
        Err(Self::status_error(
            status.as_u16(),
            body,
            SearchIndexError::IndexCreationError,
        ))
    }

    async fn bulk_upsert_documents(
        &self,
        index: &str,
        requests: &[UpsertDocumentRequest],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if requests.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        if let Some(request) = requests.iter().find(|r| r.document_id.is_empty()) {
            return Err(SearchIndexError::validation(format!(
                "document without id in bulk request: {}",
                request.body
            )));
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(Self::bulk_body(requests))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(index = %index, status = %status, body = %body, "Bulk request failed");
            return Err(Self::status_error(
                status.as_u16(),
                body,
                SearchIndexError::RequestError,
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = Self::parse_bulk_response(requests, &body)?;
        debug!(
            index = %index,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }
}
