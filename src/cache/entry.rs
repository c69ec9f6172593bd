//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation instant
    pub created_at: Instant,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
    /// Last successful read (or write); drives LRU ordering
    pub last_accessed_at: Instant,
    /// Estimated serialized size in bytes, None when serialization failed
    pub size_bytes: Option<usize>,
    /// Estimated size exceeded the owning store's compression threshold
    pub compress_candidate: bool,
}

impl<V: Serialize> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time to live, counted from now
    /// * `compression_threshold` - Size in bytes above which the entry is flagged
    pub fn new(value: V, ttl: Option<Duration>, compression_threshold: usize) -> Self {
        let now = now();
        let size_bytes = estimate_size(&value);

        Self {
            value,
            created_at: now,
            expires_at: ttl.map(|ttl| now + ttl),
            last_accessed_at: now,
            size_bytes,
            compress_candidate: size_bytes.is_some_and(|size| size > compression_threshold),
        }
    }
}

impl<V> CacheEntry<V> {
    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once `now >= expires_at`; entries without an
    /// expiration never expire by time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied instant,
    /// so a sweep can use one clock reading for every entry.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self) {
        self.last_accessed_at = now();
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now()))
    }
}

// == Utility Functions ==
/// Returns the current instant on the tokio clock.
///
/// Outside a runtime, or with an unpaused clock, this is the system monotonic
/// clock; inside a paused test runtime it follows `tokio::time::advance`.
pub fn now() -> Instant {
    Instant::now()
}

/// Estimates the serialized size of a value in bytes.
///
/// Returns `None` when the value cannot be serialized; callers treat that as
/// "size unknown" and never as an error.
pub fn estimate_size<V: Serialize>(value: &V) -> Option<usize> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Some(bytes.len()),
        Err(err) => {
            tracing::debug!(error = %err, "Size estimation failed, treating size as unknown");
            None
        }
    }
}
