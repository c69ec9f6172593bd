//! Cache Registry Module
//!
//! Owns the named instances of the application: `global`, `user` and
//! `project`, each an independent store sharing the same behaviour.

use serde_json::Value;
use tracing::info;

use crate::cache::store::StoreOptions;
use crate::cache::{CacheStats, NamedCache};
use crate::config::Config;
use crate::error::{CacheError, Result};

/// Payload type stored by the application instances.
pub type JsonCache = NamedCache<Value>;

pub const GLOBAL: &str = "global";
pub const USER: &str = "user";
pub const PROJECT: &str = "project";

// == Cache Registry ==
/// The set of named cache instances, constructed once and shared by handle.
#[derive(Debug, Clone)]
pub struct CacheRegistry {
    global: JsonCache,
    user: JsonCache,
    project: JsonCache,
}

impl CacheRegistry {
    /// Builds the three instances with capacities and policy taken from `config`.
    pub fn from_config(config: &Config) -> Self {
        let options = |max_size| StoreOptions {
            max_size,
            compression_threshold: config.compression_threshold,
            default_ttl: config.default_ttl(),
            expiry_timers: config.expiry_timers,
        };

        Self {
            global: NamedCache::new(GLOBAL, options(config.global_max_entries)),
            user: NamedCache::new(USER, options(config.user_max_entries)),
            project: NamedCache::new(PROJECT, options(config.project_max_entries)),
        }
    }

    pub fn global(&self) -> &JsonCache {
        &self.global
    }

    pub fn user(&self) -> &JsonCache {
        &self.user
    }

    pub fn project(&self) -> &JsonCache {
        &self.project
    }

    /// Looks an instance up by name.
    pub fn get(&self, name: &str) -> Result<&JsonCache> {
        match name {
            GLOBAL => Ok(&self.global),
            USER => Ok(&self.user),
            PROJECT => Ok(&self.project),
            other => Err(CacheError::UnknownInstance(other.to_string())),
        }
    }

    /// Every instance, in a stable order.
    pub fn all(&self) -> [&JsonCache; 3] {
        [&self.global, &self.user, &self.project]
    }

    /// Sweeps expired entries from every instance.
    pub fn cleanup_all(&self) -> usize {
        self.all().iter().map(|cache| cache.cleanup()).sum()
    }

    pub fn clear_all(&self) {
        for cache in self.all() {
            cache.clear();
        }
    }

    /// Removes `key` from every instance, returning how many held it.
    pub fn delete_everywhere(&self, key: &str) -> usize {
        self.all()
            .iter()
            .filter(|cache| cache.delete(key))
            .count()
    }

    pub fn stats(&self) -> Vec<CacheStats> {
        self.all().iter().map(|cache| cache.stats()).collect()
    }

    /// Cancels every pending expiry timer.
    pub fn shutdown(&self) {
        for cache in self.all() {
            cache.shutdown();
        }
        info!("Cache registry timers cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn registry() -> CacheRegistry {
        CacheRegistry::from_config(&Config {
            default_ttl: 0,
            ..Config::default()
        })
    }

    #[test]
    fn test_instances_are_independent() {
        let registry = registry();
        registry.global().set("k", json!("global"), None);
        registry.user().set("k", json!("user"), None);

        assert_eq!(registry.global().get("k"), Some(json!("global")));
        assert_eq!(registry.user().get("k"), Some(json!("user")));
        assert_eq!(registry.project().get("k"), None);
    }

    #[test]
    fn test_capacities_follow_config() {
        let registry = CacheRegistry::from_config(&Config {
            global_max_entries: 7,
            user_max_entries: 3,
            project_max_entries: 2,
            ..Config::default()
        });
        let stats = registry.stats();

        assert_eq!(stats[0].name, "global");
        assert_eq!(stats[0].max_size, 7);
        assert_eq!(stats[1].max_size, 3);
        assert_eq!(stats[2].max_size, 2);
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = registry();
        assert_eq!(registry.get("user").unwrap().name(), "user");
        assert!(matches!(
            registry.get("session"),
            Err(CacheError::UnknownInstance(_))
        ));
    }

    #[test]
    fn test_delete_everywhere() {
        let registry = registry();
        registry.global().set("shared", json!(1), None);
        registry.project().set("shared", json!(2), None);

        assert_eq!(registry.delete_everywhere("shared"), 2);
        assert_eq!(registry.delete_everywhere("shared"), 0);
    }

    #[test]
    fn test_cleanup_all_sweeps_each_instance() {
        let registry = registry();
        registry.global().set("a", json!(1), Some(Duration::from_millis(5)));
        registry.user().set("b", json!(2), Some(Duration::from_millis(5)));
        registry.project().set("c", json!(3), None);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(registry.cleanup_all(), 2);
        assert_eq!(registry.project().len(), 1);

        registry.clear_all();
        assert!(registry.all().iter().all(|cache| cache.is_empty()));
    }
}
