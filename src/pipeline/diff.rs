//! Diff calculation between the stored snapshot and a fresh parse.
//!
//! Only additions drive notifications. Removals are implicit: the next
//! snapshot simply no longer holds them. They are counted for logging.

use std::collections::HashSet;

use crate::models::{ScheduleEntry, Snapshot};

/// Changes between the previous snapshot and the current parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Entries absent from the previous snapshot, in parse order
    pub added: Vec<ScheduleEntry>,
    /// Ids stored previously but missing from the current parse
    pub removed: Vec<String>,
}

impl DiffResult {
    /// Whether a notification is due.
    pub fn has_additions(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Subsequence of `fresh` whose ids are not in `previous_ids`.
///
/// Order is preserved. A duplicated id within `fresh` is reported once.
pub fn new_entries(fresh: &[ScheduleEntry], previous_ids: &HashSet<&str>) -> Vec<ScheduleEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    fresh
        .iter()
        .filter(|e| !previous_ids.contains(e.id.as_str()))
        .filter(|e| seen.insert(e.id.as_str()))
        .cloned()
        .collect()
}

/// Calculate additions and removals against a previously read snapshot.
pub fn calculate_diff(previous: &Snapshot, fresh: &[ScheduleEntry]) -> DiffResult {
    let previous_ids = previous.ids();
    let fresh_ids: HashSet<&str> = fresh.iter().map(|e| e.id.as_str()).collect();

    let removed = previous
        .entries
        .keys()
        .filter(|id| !fresh_ids.contains(id.as_str()))
        .cloned()
        .collect();

    DiffResult {
        added: new_entries(fresh, &previous_ids),
        removed,
    }
}
