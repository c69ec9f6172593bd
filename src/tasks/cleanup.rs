//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from every
//! cache instance. This is the primary expiry mechanism; per-entry timers are
//! an optional extra.

use std::time::Duration;

use tracing::{debug, info};

use crate::cache::CacheRegistry;
use crate::error::Result;
use crate::tasks::{check_interval, ScheduledTask};

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between
/// sweeps. Each sweep locks one instance at a time. A zero `interval` is
/// rejected with [`CacheError::InvalidConfig`](crate::error::CacheError::InvalidConfig).
///
/// # Example
/// ```ignore
/// let registry = CacheRegistry::from_config(&Config::default());
/// let cleanup = spawn_cleanup_task(registry.clone(), Duration::from_secs(60))?;
/// // Later, during shutdown:
/// cleanup.cancel();
/// ```
pub fn spawn_cleanup_task(registry: CacheRegistry, interval: Duration) -> Result<ScheduledTask> {
    check_interval("cleanup", interval)?;

    let handle = tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting expiry sweep task");

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let removed = registry.cleanup_all();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    });

    Ok(ScheduledTask::new("cleanup", handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::CacheError;
    use serde_json::json;

    fn registry() -> CacheRegistry {
        CacheRegistry::from_config(&Config::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_removes_expired_entries() {
        let registry = registry();
        registry
            .user()
            .set("expire_soon", json!("value"), Some(Duration::from_secs(1)));
        registry
            .project()
            .set("also_soon", json!("value"), Some(Duration::from_secs(1)));

        let task = spawn_cleanup_task(registry.clone(), Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;

        // Removed by the sweep, not by a read
        assert_eq!(registry.user().len(), 0);
        assert_eq!(registry.project().len(), 0);

        task.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_preserves_valid_entries() {
        let registry = registry();
        registry
            .global()
            .set("long_lived", json!("value"), Some(Duration::from_secs(3600)));

        let task = spawn_cleanup_task(registry.clone(), Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(registry.global().get("long_lived"), Some(json!("value")));
        task.cancel();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_cancelled() {
        let task = spawn_cleanup_task(registry(), Duration::from_secs(1)).unwrap();

        task.cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(task.is_finished(), "Task should be finished after cancel");
        assert_eq!(task.name(), "cleanup");
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let result = spawn_cleanup_task(registry(), Duration::ZERO);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }
}
