//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity of the `global` instance
    pub global_max_entries: usize,
    /// Capacity of the `user` instance
    pub user_max_entries: usize,
    /// Capacity of the `project` instance
    pub project_max_entries: usize,
    /// Default TTL in seconds for entries set without one (0 = entries are durable)
    pub default_ttl: u64,
    /// TTL in seconds applied to preloaded entries
    pub preload_ttl: u64,
    /// Serialized size in bytes above which an entry is a compression candidate
    pub compression_threshold: usize,
    /// Interval in seconds between expiry sweeps
    pub cleanup_interval: u64,
    /// Interval in seconds between warming passes
    pub warming_interval: u64,
    /// Delay in milliseconds between two ids within one warming pass
    pub warming_delay_ms: u64,
    /// Schedule one expiry timer per entry in addition to the sweep
    pub expiry_timers: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `GLOBAL_MAX_ENTRIES` - Global instance capacity (default: 1000)
    /// - `USER_MAX_ENTRIES` - User instance capacity (default: 500)
    /// - `PROJECT_MAX_ENTRIES` - Project instance capacity (default: 500)
    /// - `DEFAULT_TTL` - Default TTL in seconds, 0 disables it (default: 0)
    /// - `PRELOAD_TTL` - TTL in seconds for preloaded entries (default: 300)
    /// - `COMPRESSION_THRESHOLD` - Compression candidate size in bytes (default: 1024)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `WARMING_INTERVAL` - Warming frequency in seconds (default: 300)
    /// - `WARMING_DELAY_MS` - Delay between warmed ids in ms (default: 100)
    /// - `EXPIRY_TIMERS` - Enable per-entry expiry timers (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            global_max_entries: env_or("GLOBAL_MAX_ENTRIES", defaults.global_max_entries),
            user_max_entries: env_or("USER_MAX_ENTRIES", defaults.user_max_entries),
            project_max_entries: env_or("PROJECT_MAX_ENTRIES", defaults.project_max_entries),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            preload_ttl: env_or("PRELOAD_TTL", defaults.preload_ttl),
            compression_threshold: env_or(
                "COMPRESSION_THRESHOLD",
                defaults.compression_threshold,
            ),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            warming_interval: env_or("WARMING_INTERVAL", defaults.warming_interval),
            warming_delay_ms: env_or("WARMING_DELAY_MS", defaults.warming_delay_ms),
            expiry_timers: env_or("EXPIRY_TIMERS", defaults.expiry_timers),
        }
    }

    /// Rejects settings that would make the background tasks spin.
    pub fn validate(&self) -> Result<()> {
        if self.cleanup_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "CLEANUP_INTERVAL must be greater than zero".to_string(),
            ));
        }
        if self.warming_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "WARMING_INTERVAL must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Default TTL as a duration, `None` when disabled.
    pub fn default_ttl(&self) -> Option<Duration> {
        (self.default_ttl > 0).then(|| Duration::from_secs(self.default_ttl))
    }

    pub fn preload_ttl(&self) -> Duration {
        Duration::from_secs(self.preload_ttl)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn warming_interval(&self) -> Duration {
        Duration::from_secs(self.warming_interval)
    }

    pub fn warming_delay(&self) -> Duration {
        Duration::from_millis(self.warming_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global_max_entries: 1000,
            user_max_entries: 500,
            project_max_entries: 500,
            default_ttl: 0,
            preload_ttl: 300,
            compression_threshold: 1024,
            cleanup_interval: 60,
            warming_interval: 300,
            warming_delay_ms: 100,
            expiry_timers: false,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
