//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction, split
//! into named instances.

mod entry;
mod lru;
mod named;
mod registry;
mod stats;
mod store;


// Re-export public types
pub use entry::{estimate_size, CacheEntry};
pub use named::NamedCache;
pub use registry::{CacheRegistry, JsonCache, GLOBAL, PROJECT, USER};
pub use stats::{CacheStats, Counters};
pub use store::{EntryStore, StoreOptions};
