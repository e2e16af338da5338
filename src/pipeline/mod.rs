//! Pipeline entry points.
//!
//! - `Watcher::tick`: one fetch → parse → diff → notify pass
//! - `run_every`: repeat ticks on a fixed cadence

pub mod diff;
pub mod tick;
pub mod watch;

pub use diff::{DiffResult, calculate_diff, new_entries};
pub use tick::{TickReport, Watcher};
pub use watch::{WatchStats, run_every};
