// src/pipeline/watch.rs

//! Local stand-in for the scheduled trigger: runs ticks on a fixed cadence.

use std::future::Future;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};

use crate::pipeline::tick::Watcher;

/// Totals over a watch session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub ticks: usize,
    pub failures: usize,
    pub notifications: usize,
}

/// Tick every `period` until `shutdown` resolves.
///
/// A failed tick is logged by [`Watcher::tick`] and the loop carries on; the
/// next tick is the retry. A tick that overruns the period delays the
/// following one instead of queueing a burst.
pub async fn run_every<F>(watcher: &Watcher, period: Duration, shutdown: F) -> WatchStats
where
    F: Future<Output = ()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stats = WatchStats::default();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Shutdown requested, stopping watch loop");
                break;
            }
            _ = ticker.tick() => {
                stats.ticks += 1;
                match watcher.tick().await {
                    Ok(report) if report.notified => stats.notifications += 1,
                    Ok(_) => {}
                    Err(_) => stats.failures += 1,
                }
            }
        }
    }

    stats
}
