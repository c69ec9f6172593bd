//! Named Cache Module
//!
//! Thread-safe, cloneable handle around an [`EntryStore`], optionally driving
//! one expiry timer per TTL entry on the ambient tokio runtime.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::store::{EntryStore, StoreOptions};
use crate::cache::CacheStats;
use crate::error::Result;

// == Named Cache ==
/// A named, independently sized cache instance.
///
/// Clones share the same underlying store. Every operation takes the
/// instance lock for the duration of one synchronous map operation; the lock
/// is never held across an await point.
#[derive(Debug)]
pub struct NamedCache<V> {
    inner: Arc<Mutex<EntryStore<V>>>,
}

impl<V> Clone for NamedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> NamedCache<V>
where
    V: Clone + Serialize + Send + 'static,
{
    // == Constructor ==
    pub fn new(name: impl Into<String>, options: StoreOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EntryStore::new(name, options))),
        }
    }

    pub fn name(&self) -> String {
        self.inner.lock().name().to_string()
    }

    // == Set ==
    /// Inserts or overwrites `key`.
    ///
    /// When expiry timers are enabled and a runtime is available, a timer is
    /// scheduled for the entry's expiry; the previous timer for the key has
    /// already been cancelled by the store.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let mut store = self.inner.lock();
        let expires_at = store.set(key.clone(), value, ttl);

        if let Some(deadline) = expires_at {
            if store.options().expiry_timers {
                self.spawn_timer(&mut store, key, deadline);
            }
        }
    }

    // == Get ==
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().has(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().delete(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().keys()
    }

    /// Eagerly removes expired entries, returning how many were removed.
    pub fn cleanup(&self) -> usize {
        let mut store = self.inner.lock();
        let removed = store.cleanup();
        if removed > 0 {
            debug!(cache = %store.name(), removed, "Swept expired entries");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    /// Number of expiry timers still pending.
    pub fn pending_timers(&self) -> usize {
        self.inner.lock().pending_timers()
    }

    /// Cancels all pending expiry timers, leaving entries in place.
    pub fn shutdown(&self) {
        self.inner.lock().cancel_timers();
    }

    // == Get Or Fetch ==
    /// Read-through helper: returns the cached value or runs `fetch` and caches
    /// its result.
    ///
    /// Concurrent callers missing on the same key each run their own fetch;
    /// the last `set` wins. A fetch error is logged and yields `None` without
    /// caching anything, and so does a fetch returning `Ok(None)`.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Option<Duration>, fetch: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>>>,
    {
        if let Some(value) = self.get(key) {
            return Some(value);
        }

        match fetch().await {
            Ok(Some(value)) => {
                self.set(key, value.clone(), ttl);
                Some(value)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(cache = %self.name(), key = %key, error = %err, "Read-through fetch failed");
                None
            }
        }
    }

    fn spawn_timer(&self, store: &mut EntryStore<V>, key: String, deadline: Instant) {
        let Ok(runtime) = Handle::try_current() else {
            // No runtime: lazy expiry and sweeps still apply.
            return;
        };

        let weak: Weak<Mutex<EntryStore<V>>> = Arc::downgrade(&self.inner);
        let timer_key = key.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                let mut store = inner.lock();
                if store.expire_key(&timer_key) {
                    debug!(cache = %store.name(), key = %timer_key, "Expiry timer removed entry");
                }
            }
        });
        store.attach_timer(key, task.abort_handle());
    }
}

// == JSON Helpers ==
impl NamedCache<Value> {
    /// Reads `key` and decodes it into `T`. A payload that does not decode is
    /// logged and treated as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(cache = %self.name(), key = %key, error = %err, "Cached payload has unexpected shape");
                None
            }
        }
    }

    /// Encodes `value` as JSON and stores it.
    pub fn set_as<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let encoded = serde_json::to_value(value)?;
        self.set(key, encoded, ttl);
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use serde::Deserialize;
    use serde_json::json;

    fn timed_cache(max_size: usize) -> NamedCache<Value> {
        NamedCache::new(
            "timed",
            StoreOptions {
                max_size,
                expiry_timers: true,
                ..StoreOptions::default()
            },
        )
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: String,
        email: String,
    }

    #[test]
    fn test_clones_share_state() {
        let cache: NamedCache<Value> = NamedCache::new("global", StoreOptions::default());
        let other = cache.clone();

        cache.set("k", json!(1), None);
        assert_eq!(other.get("k"), Some(json!(1)));
        assert_eq!(other.name(), "global");
    }

    #[test]
    fn test_timers_skipped_without_runtime() {
        let cache = timed_cache(10);
        cache.set("k", json!(1), Some(Duration::from_secs(1)));
        assert_eq!(cache.pending_timers(), 0);
        assert!(cache.has("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_removes_entry_without_read() {
        let cache = timed_cache(10);
        cache.set("a", json!({"v": 1}), Some(Duration::from_millis(100)));
        assert_eq!(cache.pending_timers(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.len(), 0, "timer removed the entry before any read");
        assert_eq!(cache.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_replaces_timer() {
        let cache = timed_cache(10);
        cache.set("a", json!(1), Some(Duration::from_millis(100)));
        cache.set("a", json!(2), Some(Duration::from_millis(500)));
        assert_eq!(cache.pending_timers(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get("a"), Some(json!(2)));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_without_ttl_cancels_timer() {
        let cache = timed_cache(10);
        cache.set("a", json!(1), Some(Duration::from_millis(100)));
        cache.set("a", json!(2), None);
        assert_eq!(cache.pending_timers(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.get("a"), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_and_clear_cancel_timers() {
        let cache = timed_cache(10);
        cache.set("a", json!(1), Some(Duration::from_secs(1)));
        cache.set("b", json!(2), Some(Duration::from_secs(1)));
        cache.set("c", json!(3), Some(Duration::from_secs(1)));

        assert!(cache.delete("a"));
        assert_eq!(cache.pending_timers(), 2);

        cache.clear();
        assert_eq!(cache.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_timers_but_keeps_entries() {
        let cache = timed_cache(10);
        cache.set("a", json!(1), Some(Duration::from_secs(1)));
        cache.shutdown();

        assert_eq!(cache.pending_timers(), 0);
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(cache.len(), 1, "no timer left to remove it");
        assert_eq!(cache.get("a"), None, "lazy expiry still applies");
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_cancels_victim_timer() {
        let cache = timed_cache(1);
        cache.set("a", json!(1), Some(Duration::from_secs(1)));
        tokio::time::advance(Duration::from_millis(1)).await;
        cache.set("b", json!(2), None);

        assert!(!cache.has("a"));
        assert_eq!(cache.pending_timers(), 0);
    }

    #[tokio::test]
    async fn test_get_or_fetch_caches_result() {
        let cache: NamedCache<Value> = NamedCache::new("global", StoreOptions::default());

        let first = cache
            .get_or_fetch("k", None, || async { Ok(Some(json!("fetched"))) })
            .await;
        assert_eq!(first, Some(json!("fetched")));

        let second = cache
            .get_or_fetch("k", None, || async { Ok(Some(json!("other"))) })
            .await;
        assert_eq!(second, Some(json!("fetched")));
    }

    #[tokio::test]
    async fn test_get_or_fetch_error_is_a_miss() {
        let cache: NamedCache<Value> = NamedCache::new("global", StoreOptions::default());

        let result = cache
            .get_or_fetch("k", None, || async {
                Err(CacheError::data_source("users", "k", "down"))
            })
            .await;
        assert_eq!(result, None);
        assert!(cache.is_empty());

        let absent = cache.get_or_fetch("k", None, || async { Ok(None) }).await;
        assert_eq!(absent, None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_typed_helpers() {
        let cache: NamedCache<Value> = NamedCache::new("user", StoreOptions::default());
        let profile = Profile {
            id: "U1".to_string(),
            email: "u1@example.com".to_string(),
        };

        cache.set_as("user:U1:profile", &profile, None).unwrap();
        assert_eq!(cache.get_as::<Profile>("user:U1:profile"), Some(profile));

        cache.set("user:U2:profile", json!(42), None);
        assert_eq!(cache.get_as::<Profile>("user:U2:profile"), None);
    }
}
