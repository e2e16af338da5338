//! Storage abstractions for the slot snapshot.
//!
//! The snapshot is one document holding every slot seen on the last
//! successful tick, keyed by slot id. It is only ever replaced as a whole.
//!
//! ## Layout
//!
//! ```text
//! storage/
//! └── snapshot.json         # { "updated_at": …, "entries": { id: entry, … } }
//! ```

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ScheduleEntry, Snapshot};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Document name of the snapshot inside a backend.
pub const SNAPSHOT_KEY: &str = "snapshot.json";

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot; empty when nothing was stored yet.
    async fn read_all(&self) -> Result<Snapshot>;

    /// Atomically overwrite the stored set with `entries`.
    ///
    /// Readers see either the previous set or the new one, never a mix.
    /// Concurrent callers resolve as last writer wins.
    async fn replace_all(&self, entries: &[ScheduleEntry]) -> Result<()>;

    /// Whether an entry with `id` is stored.
    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.read_all().await?.contains(id))
    }
}
