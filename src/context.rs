//! Cache Context
//!
//! Explicit, host-owned wiring of every cache component. The host builds one
//! context at startup, hands clones of its parts to whoever needs them, and
//! calls [`CacheContext::shutdown`] to stop every timer and background task.
//! Tests build as many isolated contexts as they like.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::AbortHandle;
use tracing::info;

use crate::analytics::{HealthMonitor, HealthReport, HealthThresholds, MetricsSnapshot};
use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::error::Result;
use crate::invalidation::{
    default_table, DependencyTable, EntityRef, InvalidationReport, Invalidator, Revalidator,
};
use crate::tasks::{spawn_cleanup_task, spawn_warming_task, ScheduledTask};
use crate::warming::{DataSources, PreloadTarget, Preloader};

// == Cache Context ==
pub struct CacheContext {
    config: Config,
    registry: CacheRegistry,
    invalidator: Invalidator,
    preloader: Preloader,
    monitor: HealthMonitor,
    /// Background tasks started through this context
    tasks: Mutex<Vec<AbortHandle>>,
}

impl CacheContext {
    /// Builds a context with the default dependency table.
    pub fn init(
        config: Config,
        sources: DataSources,
        revalidator: Arc<dyn Revalidator>,
    ) -> Result<Self> {
        Self::init_with_table(config, default_table(), sources, revalidator)
    }

    /// Builds a context with a caller-supplied dependency table.
    pub fn init_with_table(
        config: Config,
        table: DependencyTable,
        sources: DataSources,
        revalidator: Arc<dyn Revalidator>,
    ) -> Result<Self> {
        config.validate()?;

        let registry = CacheRegistry::from_config(&config);
        let invalidator = Invalidator::new(registry.clone(), table, revalidator);
        let preloader = Preloader::new(registry.clone(), sources, config.preload_ttl());
        let monitor = HealthMonitor::new(registry.clone(), HealthThresholds::default());

        info!(
            global = config.global_max_entries,
            user = config.user_max_entries,
            project = config.project_max_entries,
            expiry_timers = config.expiry_timers,
            "Cache context initialized"
        );

        Ok(Self {
            config,
            registry,
            invalidator,
            preloader,
            monitor,
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }

    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }

    pub fn preloader(&self) -> &Preloader {
        &self.preloader
    }

    pub fn monitor(&self) -> &HealthMonitor {
        &self.monitor
    }

    // == Invalidation ==
    pub fn cascade_invalidation(
        &self,
        entity_type: &str,
        id: &str,
        owner_id: Option<&str>,
    ) -> InvalidationReport {
        self.invalidator
            .cascade_invalidation(entity_type, id, owner_id)
    }

    pub fn batch_invalidation(&self, entities: &[EntityRef]) -> InvalidationReport {
        self.invalidator.batch_invalidation(entities)
    }

    // == Warming ==
    pub async fn preload(&self, target: &PreloadTarget, owner_id: Option<&str>) -> Option<Value> {
        self.preloader.preload(target, owner_id).await
    }

    /// Starts recurring dashboard warming for `ids`. Must be called within a
    /// tokio runtime; a zero `interval` is rejected.
    pub fn schedule_recurring_warming(
        &self,
        ids: Vec<String>,
        interval: Duration,
    ) -> Result<ScheduledTask> {
        let task = spawn_warming_task(
            self.preloader.clone(),
            ids,
            interval,
            self.config.warming_delay(),
        )?;
        self.track(&task);
        Ok(task)
    }

    /// Starts the periodic expiry sweep. Must be called within a tokio runtime;
    /// a zero `interval` is rejected.
    pub fn schedule_cleanup(&self, interval: Duration) -> Result<ScheduledTask> {
        let task = spawn_cleanup_task(self.registry.clone(), interval)?;
        self.track(&task);
        Ok(task)
    }

    // == Analytics ==
    pub fn track_metrics(&self) -> MetricsSnapshot {
        self.monitor.track_metrics()
    }

    pub fn health_report(&self) -> HealthReport {
        self.monitor.health_report()
    }

    // == Shutdown ==
    /// Cancels every background task and expiry timer. Cached entries remain
    /// readable until dropped.
    pub fn shutdown(&self) {
        let tasks: Vec<AbortHandle> = self.tasks.lock().drain(..).collect();
        for task in &tasks {
            task.abort();
        }
        self.registry.shutdown();
        info!(tasks = tasks.len(), "Cache context shut down");
    }

    fn track(&self, task: &ScheduledTask) {
        let mut tasks = self.tasks.lock();
        tasks.retain(|handle| !handle.is_finished());
        tasks.push(task.abort_handle());
    }

    /// Background tasks started through this context that are still running.
    pub fn running_tasks(&self) -> usize {
        self.tasks
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::invalidation::RecordingRevalidator;
    use crate::warming::MemorySource;
    use serde_json::json;

    fn sources() -> DataSources {
        DataSources {
            users: Arc::new(MemorySource::new("users").with("U1", json!({"id": "U1"}))),
            user_projects: Arc::new(MemorySource::new("user_projects")),
            user_stats: Arc::new(MemorySource::new("user_stats")),
            projects: Arc::new(MemorySource::new("projects")),
        }
    }

    #[test]
    fn test_init_rejects_invalid_config() {
        let config = Config {
            cleanup_interval: 0,
            ..Config::default()
        };
        let result = CacheContext::init(config, sources(), Arc::new(RecordingRevalidator::new()));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = CacheContext::init(Config::default(), sources(), Arc::new(RecordingRevalidator::new()))
            .unwrap();
        let b = CacheContext::init(Config::default(), sources(), Arc::new(RecordingRevalidator::new()))
            .unwrap();

        a.registry().user().set("k", json!(1), None);
        assert!(!b.registry().user().has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_tasks_and_timers() {
        let config = Config {
            expiry_timers: true,
            ..Config::default()
        };
        let ctx = CacheContext::init(config, sources(), Arc::new(RecordingRevalidator::new())).unwrap();

        ctx.registry()
            .global()
            .set("k", json!(1), Some(Duration::from_secs(60)));
        let cleanup = ctx.schedule_cleanup(Duration::from_secs(1)).unwrap();
        let warming = ctx
            .schedule_recurring_warming(vec!["U1".to_string()], Duration::from_secs(5))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(ctx.registry().global().has("dashboard:U1"));

        ctx.shutdown();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(cleanup.is_finished());
        assert!(warming.is_finished());
        assert_eq!(ctx.registry().global().pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_schedules_nothing() {
        let ctx = CacheContext::init(Config::default(), sources(), Arc::new(RecordingRevalidator::new()))
            .unwrap();

        let warming = ctx.schedule_recurring_warming(vec!["U1".to_string()], Duration::ZERO);
        let cleanup = ctx.schedule_cleanup(Duration::ZERO);

        assert!(matches!(warming, Err(CacheError::InvalidConfig(_))));
        assert!(matches!(cleanup, Err(CacheError::InvalidConfig(_))));
        assert_eq!(ctx.running_tasks(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!ctx.registry().global().has("dashboard:U1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_tasks_are_pruned_on_reschedule() {
        let ctx = CacheContext::init(Config::default(), sources(), Arc::new(RecordingRevalidator::new()))
            .unwrap();

        for _ in 0..5 {
            let task = ctx.schedule_cleanup(Duration::from_secs(60)).unwrap();
            task.cancel();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        ctx.schedule_cleanup(Duration::from_secs(60)).unwrap();

        assert_eq!(ctx.tasks.lock().len(), 1);
        assert_eq!(ctx.running_tasks(), 1);
        ctx.shutdown();
    }
}
