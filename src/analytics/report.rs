//! Report types produced by the health monitor.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;

// == Health Status ==
/// Overall classification; ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Ok => "ok",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        }
    }
}

// == Metrics Snapshot ==
/// Point-in-time sample of every instance.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub instances: Vec<CacheStats>,
    pub total_entries: usize,
    /// Estimated serialized bytes across all instances
    pub total_size: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    /// Hit rate across all instances
    pub hit_rate: f64,
}

impl MetricsSnapshot {
    pub fn from_stats(instances: Vec<CacheStats>) -> Self {
        let total_entries: usize = instances.iter().map(|s| s.size).sum();
        let total_size: usize = instances.iter().map(|s| s.total_size).sum();
        let total_hits: u64 = instances.iter().map(|s| s.hits).sum();
        let total_misses: u64 = instances.iter().map(|s| s.misses).sum();
        let requests = total_hits + total_misses;
        let hit_rate = if requests == 0 {
            0.0
        } else {
            total_hits as f64 / requests as f64
        };

        Self {
            timestamp: Utc::now(),
            instances,
            total_entries,
            total_size,
            total_hits,
            total_misses,
            hit_rate,
        }
    }
}

// == Instance Health ==
#[derive(Debug, Clone, Serialize)]
pub struct InstanceHealth {
    pub name: String,
    pub status: HealthStatus,
    pub hit_rate: f64,
    pub utilization_percent: f64,
    pub expired_count: usize,
}

// == Health Report ==
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    /// Worst status over all instances
    pub status: HealthStatus,
    pub instances: Vec<InstanceHealth>,
    pub recommendations: Vec<String>,
}
