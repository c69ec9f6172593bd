//! Health Monitor
//!
//! Samples every instance and classifies the cache as ok, warning or
//! critical. Sampling only reads statistics; it never expires, evicts or
//! invalidates anything.

use chrono::Utc;
use tracing::{info, warn};

use crate::analytics::report::{
    HealthReport, HealthStatus, InstanceHealth, MetricsSnapshot,
};
use crate::cache::{CacheRegistry, CacheStats};

// == Thresholds ==
#[derive(Debug, Clone)]
pub struct HealthThresholds {
    /// Utilization percentage at which an instance is a warning
    pub utilization_warning: f64,
    /// Utilization percentage at which an instance is critical
    pub utilization_critical: f64,
    /// Hit rate below which an instance is a warning
    pub hit_rate_warning: f64,
    /// Hit rate below which an instance is critical
    pub hit_rate_critical: f64,
    /// Requests an instance must have served before its hit rate is judged
    pub min_requests: u64,
    /// Fraction of entries expired-but-present that calls for more frequent sweeps
    pub expired_backlog_ratio: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            utilization_warning: 75.0,
            utilization_critical: 90.0,
            hit_rate_warning: 0.6,
            hit_rate_critical: 0.3,
            min_requests: 1,
            expired_backlog_ratio: 0.1,
        }
    }
}

// == Health Monitor ==
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    registry: CacheRegistry,
    thresholds: HealthThresholds,
}

impl HealthMonitor {
    pub fn new(registry: CacheRegistry, thresholds: HealthThresholds) -> Self {
        Self {
            registry,
            thresholds,
        }
    }

    // == Track Metrics ==
    /// Samples every instance and logs the sample.
    pub fn track_metrics(&self) -> MetricsSnapshot {
        let snapshot = MetricsSnapshot::from_stats(self.registry.stats());

        for stats in &snapshot.instances {
            info!(
                cache = %stats.name,
                size = stats.size,
                max_size = stats.max_size,
                hits = stats.hits,
                misses = stats.misses,
                evictions = stats.evictions,
                hit_rate = stats.hit_rate(),
                "Cache metrics"
            );
        }
        info!(
            entries = snapshot.total_entries,
            bytes = snapshot.total_size,
            hit_rate = snapshot.hit_rate,
            "Cache metrics totals"
        );

        snapshot
    }

    // == Health Report ==
    /// Classifies every instance and collects recommendations.
    pub fn health_report(&self) -> HealthReport {
        let mut recommendations = Vec::new();
        let instances: Vec<InstanceHealth> = self
            .registry
            .stats()
            .iter()
            .map(|stats| self.assess(stats, &mut recommendations))
            .collect();

        let status = instances
            .iter()
            .map(|instance| instance.status)
            .max()
            .unwrap_or(HealthStatus::Ok);

        if status == HealthStatus::Ok {
            info!("Cache health ok");
        } else {
            warn!(status = status.as_str(), recommendations = recommendations.len(), "Cache health degraded");
        }

        HealthReport {
            timestamp: Utc::now(),
            status,
            instances,
            recommendations,
        }
    }

    fn assess(&self, stats: &CacheStats, recommendations: &mut Vec<String>) -> InstanceHealth {
        let t = &self.thresholds;
        let mut status = HealthStatus::Ok;

        if stats.utilization_percent >= t.utilization_critical {
            status = status.max(HealthStatus::Critical);
            recommendations.push(format!(
                "Cache '{}' is {:.0}% full: raise its max size or shorten TTLs",
                stats.name, stats.utilization_percent
            ));
        } else if stats.utilization_percent >= t.utilization_warning {
            status = status.max(HealthStatus::Warning);
            recommendations.push(format!(
                "Cache '{}' is {:.0}% full: consider raising its max size",
                stats.name, stats.utilization_percent
            ));
        }

        let hit_rate = stats.hit_rate();
        if stats.total_requests() >= t.min_requests {
            if hit_rate < t.hit_rate_critical {
                status = status.max(HealthStatus::Critical);
                recommendations.push(format!(
                    "Cache '{}' hit rate is {:.0}%: review key usage, raise TTLs and add warming",
                    stats.name,
                    hit_rate * 100.0
                ));
            } else if hit_rate < t.hit_rate_warning {
                status = status.max(HealthStatus::Warning);
                recommendations.push(format!(
                    "Cache '{}' hit rate is {:.0}%: raise TTLs or add warming",
                    stats.name,
                    hit_rate * 100.0
                ));
            }
        }

        if stats.size > 0 && stats.expired_count as f64 > stats.size as f64 * t.expired_backlog_ratio {
            status = status.max(HealthStatus::Warning);
            recommendations.push(format!(
                "Cache '{}' holds {} expired entries: run cleanup more often",
                stats.name, stats.expired_count
            ));
        }

        InstanceHealth {
            name: stats.name.clone(),
            status,
            hit_rate,
            utilization_percent: stats.utilization_percent,
            expired_count: stats.expired_count,
        }
    }
}
