//! Entry Store Module
//!
//! Main cache engine combining HashMap storage with LRU eviction and TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::entry::now;
use crate::cache::lru::{find_lru_victim, needs_eviction};
use crate::cache::stats::{utilization_percent, Counters};
use crate::cache::{CacheEntry, CacheStats};

// == Store Options ==
/// Policy shared by every store of a cache tier.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Maximum number of entries
    pub max_size: usize,
    /// Serialized size in bytes above which an entry is a compression candidate
    pub compression_threshold: usize,
    /// TTL applied when `set` is called without one; None = durable
    pub default_ttl: Option<Duration>,
    /// Spawn one expiry timer per TTL entry (sweeps still run regardless)
    pub expiry_timers: bool,
}

impl StoreOptions {
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_size: 1000,
            compression_threshold: 1024,
            default_ttl: None,
            expiry_timers: false,
        }
    }
}

// == Entry Store ==
/// Single-owner cache storage with LRU eviction and TTL support.
///
/// All operations are synchronous; shared access goes through
/// [`NamedCache`](crate::cache::NamedCache).
#[derive(Debug)]
pub struct EntryStore<V> {
    /// Instance name used in logs and stats
    name: String,
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Pending per-key expiry timers
    timers: HashMap<String, AbortHandle>,
    /// Cumulative hit/miss/eviction counters
    counters: Counters,
    options: StoreOptions,
}

impl<V: Clone + Serialize> EntryStore<V> {
    // == Constructor ==
    /// Creates a new empty store.
    pub fn new(name: impl Into<String>, options: StoreOptions) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            timers: HashMap::new(),
            counters: Counters::default(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry for the key.
    ///
    /// A pending expiry timer for the key is cancelled first. If the key is new
    /// and the store is full, the least recently accessed entry is evicted.
    /// Without `ttl` the store's default TTL applies; with neither the entry is
    /// durable until evicted or deleted.
    ///
    /// Returns the expiry instant of the new entry.
    pub fn set(&mut self, key: String, value: V, ttl: Option<Duration>) -> Option<Instant> {
        self.cancel_timer(&key);

        if needs_eviction(&self.entries, &key, self.options.max_size) {
            self.evict_one();
        }

        let ttl = ttl.or(self.options.default_ttl);
        let entry = CacheEntry::new(value, ttl, self.options.compression_threshold);
        if entry.compress_candidate {
            debug!(
                cache = %self.name,
                key = %key,
                size = ?entry.size_bytes,
                "Entry exceeds compression threshold"
            );
        }
        let expires_at = entry.expires_at;
        self.entries.insert(key, entry);
        expires_at
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed and reported as absent. A hit refreshes the
    /// entry's access instant.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get_mut(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                entry.touch();
                self.counters.record_hit();
                return Some(entry.value.clone());
            }
            None => false,
        };

        if expired {
            self.remove(key);
            debug!(cache = %self.name, key = %key, "Lazily expired entry on read");
        }
        self.counters.record_miss();
        None
    }

    // == Has ==
    /// Whether `get` would return a value. Counts as a read.
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // == Delete ==
    /// Removes an entry and its timer. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove(key)
    }

    // == Clear ==
    /// Removes all entries and cancels all timers.
    pub fn clear(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        self.entries.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self) -> usize {
        let now = now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove(key);
        }
        expired_keys.len()
    }

    // == Expire Key ==
    /// Removes `key` only if it is currently expired.
    ///
    /// Used by expiry timers; a key that was overwritten with a fresh entry
    /// survives even if a stale timer fires.
    pub fn expire_key(&mut self, key: &str) -> bool {
        let expired = self.entries.get(key).is_some_and(|entry| entry.is_expired());
        expired && self.remove(key)
    }

    // == Timers ==
    /// Associates a spawned expiry timer with `key`, cancelling any previous one.
    pub fn attach_timer(&mut self, key: String, timer: AbortHandle) {
        if let Some(previous) = self.timers.insert(key, timer) {
            previous.abort();
        }
    }

    /// Number of pending expiry timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Cancels every pending timer without touching entries.
    pub fn cancel_timers(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }

    // == Length ==
    /// Returns the current number of entries, including not yet removed expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns every stored key in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Read-only access to an entry, without touching or expiring it.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Stats ==
    /// Returns current statistics. Read-only: expired entries are counted, not removed.
    pub fn stats(&self) -> CacheStats {
        let now = now();
        let mut expired_count = 0;
        let mut total_size = 0;
        let mut compression_candidates = 0;

        for entry in self.entries.values() {
            if entry.is_expired_at(now) {
                expired_count += 1;
            }
            total_size += entry.size_bytes.unwrap_or(0);
            if entry.compress_candidate {
                compression_candidates += 1;
            }
        }

        CacheStats {
            name: self.name.clone(),
            size: self.entries.len(),
            max_size: self.options.max_size,
            expired_count,
            total_size,
            utilization_percent: utilization_percent(self.entries.len(), self.options.max_size),
            compression_candidates,
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
        }
    }

    fn evict_one(&mut self) {
        if let Some(victim) = find_lru_victim(&self.entries) {
            self.remove(&victim);
            self.counters.record_eviction();
            debug!(cache = %self.name, key = %victim, "Evicted least recently used entry");
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        self.cancel_timer(key);
        self.entries.remove(key).is_some()
    }

    fn cancel_timer(&mut self, key: &str) {
        if let Some(timer) = self.timers.remove(key) {
            timer.abort();
        }
    }
}
