//! Snapshot of the slots believed to be listed upstream.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ScheduleEntry;

/// Full set of entries keyed by id, as persisted by a snapshot store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// ISO 8601 timestamp of the last replacement, `None` before the first tick
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Entries keyed by [`ScheduleEntry::id`]
    #[serde(default)]
    pub entries: BTreeMap<String, ScheduleEntry>,
}

impl Snapshot {
    /// Build a snapshot from freshly parsed entries. Later duplicates of an id
    /// overwrite earlier ones.
    pub fn from_entries(entries: &[ScheduleEntry]) -> Self {
        Self {
            updated_at: Some(Utc::now()),
            entries: entries
                .iter()
                .map(|e| (e.id.clone(), e.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Borrowed set of stored ids.
    pub fn ids(&self) -> HashSet<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
