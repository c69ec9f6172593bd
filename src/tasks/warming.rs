//! Recurring Warming Task
//!
//! Re-preloads the dashboards of a fixed list of users on an interval. Ids
//! within one pass are spaced by a short delay to bound the burst on the data
//! source. The list is not bounded here; callers keep it small.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::tasks::{check_interval, ScheduledTask};
use crate::warming::{PreloadTarget, Preloader};

// == Warming Pass ==
/// Outcome of one pass over the target ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmingPass {
    pub warmed: usize,
    pub skipped: usize,
}

/// Warms each id once, in order, sleeping `delay` between ids.
///
/// An id whose preload yields nothing is counted as skipped and the pass
/// moves on.
pub async fn warm_pass(preloader: &Preloader, ids: &[String], delay: Duration) -> WarmingPass {
    let mut pass = WarmingPass::default();

    for (index, id) in ids.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let target = PreloadTarget::UserDashboard(id.clone());
        match preloader.preload(&target, Some(id.as_str())).await {
            Some(_) => pass.warmed += 1,
            None => {
                warn!(user = %id, "Warming skipped id");
                pass.skipped += 1;
            }
        }
    }

    pass
}

/// Spawns a task that runs [`warm_pass`] immediately and then every `interval`.
///
/// A zero `interval` is rejected before anything is spawned.
pub fn spawn_warming_task(
    preloader: Preloader,
    ids: Vec<String>,
    interval: Duration,
    delay: Duration,
) -> Result<ScheduledTask> {
    check_interval("warming", interval)?;

    let handle = tokio::spawn(async move {
        info!(
            ids = ids.len(),
            interval_ms = interval.as_millis() as u64,
            "Starting recurring warming task"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let pass = warm_pass(&preloader, &ids, delay).await;
            debug!(warmed = pass.warmed, skipped = pass.skipped, "Warming pass complete");
        }
    });

    Ok(ScheduledTask::new("warming", handle))
}
