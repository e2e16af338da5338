//! In-memory storage implementation.
//!
//! Not durable. Backs dry runs and tests; the whole snapshot is swapped under
//! one write lock.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{ScheduleEntry, Snapshot};
use crate::storage::SnapshotStore;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<Snapshot>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of entries.
    pub fn with_entries(entries: &[ScheduleEntry]) -> Self {
        Self {
            inner: RwLock::new(Snapshot::from_entries(entries)),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStorage {
    async fn read_all(&self) -> Result<Snapshot> {
        Ok(self.inner.read().await.clone())
    }

    async fn replace_all(&self, entries: &[ScheduleEntry]) -> Result<()> {
        let snapshot = Snapshot::from_entries(entries);
        *self.inner.write().await = snapshot;
        Ok(())
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.inner.read().await.contains(id))
    }
}
