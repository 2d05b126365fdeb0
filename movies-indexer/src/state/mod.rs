//! Watermark persistence.
//!
//! The pipeline checkpoints a single value: the watermark of the last cycle
//! that fully succeeded.

mod json_file;

use async_trait::async_trait;
use movies_indexer_shared::Watermark;

use crate::errors::StateError;

pub use json_file::JsonFileStateStore;

/// Durable single-record store for the watermark.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the watermark, or [`Watermark::beginning`] if none was ever stored.
    async fn get(&self) -> Result<Watermark, StateError>;

    /// Replace the stored watermark.
    async fn set(&self, watermark: Watermark) -> Result<(), StateError>;
}
