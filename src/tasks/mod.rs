//! Background Tasks Module
//!
//! Contains background tasks that run periodically until cancelled.
//!
//! # Tasks
//! - Cleanup: sweeps expired entries out of every cache instance
//! - Warming: re-preloads the dashboards of a bounded list of users

mod cleanup;
mod warming;

use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};

use crate::error::{CacheError, Result};

pub use cleanup::spawn_cleanup_task;
pub use warming::{spawn_warming_task, warm_pass, WarmingPass};

// == Scheduled Task ==
/// Cancellable handle to a periodic background task.
///
/// Dropping the handle detaches the task; it keeps running until
/// [`cancel`](Self::cancel) is called.
#[derive(Debug)]
pub struct ScheduledTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub(crate) fn new(name: &'static str, handle: JoinHandle<()>) -> Self {
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stops the task at its next await point. Idempotent.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub(crate) fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }
}

/// Rejects a zero period; a zero-period task would spin or panic.
fn check_interval(task: &str, interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(CacheError::InvalidConfig(format!(
            "{task} interval must be greater than zero"
        )));
    }
    Ok(())
}
