// src/models/mod.rs

//! Domain models for the slot watcher.

mod config;
mod entry;
mod snapshot;

// Re-export all public types
pub use config::{
    Config, MessagesConfig, MessengerConfig, ScheduleConfig, SelectorConfig, SourceConfig,
    StorageConfig,
};
pub use entry::{RawSlot, ScheduleEntry, normalize_time_range};
pub use snapshot::Snapshot;
