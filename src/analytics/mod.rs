//! Analytics Module
//!
//! Hit/miss sampling and health classification across cache instances.

mod monitor;
mod report;

pub use monitor::{HealthMonitor, HealthThresholds};
pub use report::{HealthReport, HealthStatus, InstanceHealth, MetricsSnapshot};
