//! JSON file state store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use movies_indexer_shared::Watermark;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::errors::StateError;
use crate::state::StateStore;

/// On-disk record: `{"modified": "<RFC 3339 timestamp>"}`.
#[derive(Debug, Serialize)]
struct StateRecord {
    modified: Watermark,
}

/// The record as read back. Timestamps without an offset are taken as UTC.
#[derive(Debug, Default, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    modified: Option<String>,
}

/// Stores the watermark in a small JSON file.
///
/// Writes go to a sibling temporary file that is synced and then renamed over
/// the target, so readers see either the old record or the new one.
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, action: &str, err: std::io::Error) -> StateError {
        StateError::io(format!("{} {}: {}", action, self.path.display(), err))
    }

    /// Write `body` to `temp_path`, sync it and rename it over the target.
    async fn replace_with(&self, temp_path: &Path, body: &[u8]) -> Result<(), StateError> {
        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| self.io_error("failed to create temporary file for", e))?;
        file.write_all(body)
            .await
            .map_err(|e| self.io_error("failed to write", e))?;
        file.sync_all()
            .await
            .map_err(|e| self.io_error("failed to sync", e))?;
        drop(file);

        fs::rename(temp_path, &self.path)
            .await
            .map_err(|e| self.io_error("failed to replace", e))
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn get(&self) -> Result<Watermark, StateError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state file, starting from the beginning");
                return Ok(Watermark::beginning());
            }
            Err(e) => return Err(self.io_error("failed to read", e)),
        };

        if contents.trim().is_empty() {
            return Ok(Watermark::beginning());
        }

        let record: StoredRecord = serde_json::from_str(&contents).map_err(|e| {
            StateError::corrupt(format!("{}: {}", self.path.display(), e))
        })?;

        match record.modified {
            Some(modified) => modified.parse().map_err(|e| {
                StateError::corrupt(format!("{}: invalid timestamp {:?}: {}", self.path.display(), modified, e))
            }),
            None => Ok(Watermark::beginning()),
        }
    }

    async fn set(&self, watermark: Watermark) -> Result<(), StateError> {
        let record = StateRecord { modified: watermark };
        let body = serde_json::to_vec(&record)
            .map_err(|e| StateError::io(format!("failed to encode state: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error("failed to create directory for", e))?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = self.replace_with(&temp_path, &body).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temporary state file");
                }
            }
            return Err(e);
        }

        debug!(path = %self.path.display(), watermark = %watermark, "Watermark persisted");
        Ok(())
    }
}
