//! LRU Eviction Module
//!
//! Picks eviction victims by scanning `last_accessed_at` timestamps.
//!
//! There is no access-order list to keep in sync: every entry already carries
//! its last access instant, so choosing a victim is one O(n) pass over the
//! map. Stores are bounded to hundreds or low thousands of entries.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::cache::CacheEntry;

// == Find Victim ==
/// Returns the key with the oldest `last_accessed_at`, or None for an empty map.
///
/// Ties resolve to whichever entry the map yields first; callers must not
/// rely on that order.
pub fn find_lru_victim<V>(entries: &HashMap<String, CacheEntry<V>>) -> Option<String> {
    let mut victim: Option<(&String, Instant)> = None;

    for (key, entry) in entries {
        match victim {
            Some((_, oldest)) if entry.last_accessed_at >= oldest => {}
            _ => victim = Some((key, entry.last_accessed_at)),
        }
    }

    victim.map(|(key, _)| key.clone())
}

// == Needs Eviction ==
/// Whether inserting `key` requires making room first.
///
/// Overwrites never evict, and an empty store never evicts even when
/// `max_size` is zero.
pub fn needs_eviction<V>(
    entries: &HashMap<String, CacheEntry<V>>,
    key: &str,
    max_size: usize,
) -> bool {
    !entries.is_empty() && !entries.contains_key(key) && entries.len() >= max_size
}
