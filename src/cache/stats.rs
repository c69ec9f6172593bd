//! Cache Statistics Module
//!
//! Point-in-time statistics for a named cache instance: occupancy, estimated
//! memory, expiry backlog and the cumulative hit/miss/eviction counters.

use serde::Serialize;

// == Counters ==
/// Cumulative counters updated as a side effect of store operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Cache Stats ==
/// Snapshot of one named cache instance.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Instance name
    pub name: String,
    /// Current number of entries
    pub size: usize,
    /// Capacity bound
    pub max_size: usize,
    /// Entries past their expiry that have not been removed yet (estimate)
    pub expired_count: usize,
    /// Sum of estimated serialized sizes in bytes
    pub total_size: usize,
    /// `size / max_size` as a percentage
    pub utilization_percent: f64,
    /// Entries flagged as compression candidates
    pub compression_candidates: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Hits plus misses.
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }
}

/// `size / max_size` in percent; a zero capacity with any entry counts as full.
pub fn utilization_percent(size: usize, max_size: usize) -> f64 {
    if max_size == 0 {
        if size == 0 {
            0.0
        } else {
            100.0
        }
    } else {
        size as f64 / max_size as f64 * 100.0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hits: u64, misses: u64) -> CacheStats {
        CacheStats {
            name: "test".to_string(),
            size: 0,
            max_size: 10,
            expired_count: 0,
            total_size: 0,
            utilization_percent: 0.0,
            compression_candidates: 0,
            hits,
            misses,
            evictions: 0,
        }
    }

    #[test]
    fn test_counters_new() {
        let counters = Counters::default();
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.misses, 0);
        assert_eq!(counters.evictions, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(stats(0, 0).hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        assert_eq!(stats(3, 0).hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        assert_eq!(stats(1, 1).hit_rate(), 0.5);
        assert_eq!(stats(1, 1).total_requests(), 2);
    }

    #[test]
    fn test_record_counters() {
        let mut counters = Counters::default();
        counters.record_hit();
        counters.record_miss();
        counters.record_eviction();
        counters.record_eviction();
        assert_eq!(
            counters,
            Counters {
                hits: 1,
                misses: 1,
                evictions: 2
            }
        );
    }

    #[test]
    fn test_utilization_percent() {
        assert_eq!(utilization_percent(0, 10), 0.0);
        assert_eq!(utilization_percent(5, 10), 50.0);
        assert_eq!(utilization_percent(0, 0), 0.0);
        assert_eq!(utilization_percent(1, 0), 100.0);
    }
}
