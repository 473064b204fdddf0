//! Download queue storage and persistence.
//!
//! The whole queue is kept as a single JSON document, rewritten atomically
//! after every mutation.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::models::{QueueItem, QueueStatus};

/// Trait for download queue storage operations.
pub trait QueueStore: Send + Sync {
    /// Load the persisted queue, already normalized for a fresh start.
    fn load(&self) -> Result<Vec<QueueItem>>;

    /// Replace the persisted queue with `items`.
    fn save(&self, items: &[QueueItem]) -> Result<()>;
}

/// JSON file backed implementation of [`QueueStore`].
pub struct JsonQueueStore {
    path: PathBuf,
}

impl JsonQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueueStore for JsonQueueStore {
    fn load(&self) -> Result<Vec<QueueItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read queue file: {:?}", self.path))?;
        let items: Vec<QueueItem> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse queue file: {:?}", self.path))?;

        let total = items.len();
        let items = normalize_loaded(items);
        info!(
            "Loaded {} queue items from {:?} ({} completed dropped)",
            items.len(),
            self.path,
            total - items.len()
        );
        Ok(items)
    }

    fn save(&self, items: &[QueueItem]) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let json = serde_json::to_vec_pretty(items).context("Failed to serialize queue")?;
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to write queue file: {:?}", self.path))?;
        Ok(())
    }
}

/// Drop completed items and put interrupted ones back in line.
///
/// Failed items stay, so they can be retried explicitly.
pub fn normalize_loaded(items: Vec<QueueItem>) -> Vec<QueueItem> {
    items
        .into_iter()
        .filter(|item| item.status != QueueStatus::Completed)
        .map(|mut item| {
            if !item.status.is_terminal() && item.status != QueueStatus::Queued {
                warn!(
                    "Queue item {} was {} at shutdown, re-queueing",
                    item.id,
                    item.status.as_str()
                );
                item.status = QueueStatus::Queued;
            }
            item.progress_label = None;
            item
        })
        .collect()
}
