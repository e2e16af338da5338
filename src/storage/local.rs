//! Local filesystem storage implementation.
//!
//! Keeps the snapshot in `{root}/snapshot.json`. Writes go to a temp file
//! unique to the writer and are renamed over the target, so a reader always
//! gets a complete document and overlapping writers end as last writer wins.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{ScheduleEntry, Snapshot};
use crate::storage::{SNAPSHOT_KEY, SnapshotStore};

/// Distinguishes temp files of concurrent writers within one process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}.{}.tmp", std::process::id(), seq));

        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &path).await
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        Ok(result?)
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SnapshotStore for LocalStorage {
    async fn read_all(&self) -> Result<Snapshot> {
        match self.read_json::<Snapshot>(SNAPSHOT_KEY).await {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => {
                log::debug!("No {} found, starting empty", SNAPSHOT_KEY);
                Ok(Snapshot::default())
            }
            Err(e) => Err(AppError::store(format!(
                "reading {}: {e}",
                self.path(SNAPSHOT_KEY).display()
            ))),
        }
    }

    async fn replace_all(&self, entries: &[ScheduleEntry]) -> Result<()> {
        let snapshot = Snapshot::from_entries(entries);
        self.write_json(SNAPSHOT_KEY, &snapshot)
            .await
            .map_err(|e| {
                AppError::store(format!(
                    "writing {}: {e}",
                    self.path(SNAPSHOT_KEY).display()
                ))
            })?;
        log::debug!("Snapshot replaced with {} entries", snapshot.len());
        Ok(())
    }
}
