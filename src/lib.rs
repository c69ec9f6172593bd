//! Tiered Cache - An in-process tiered memory cache
//!
//! Named cache instances with TTL expiration and LRU eviction, cascading
//! dependency-based invalidation, preloading and warming, and health analytics.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod invalidation;
pub mod keys;
pub mod tasks;
pub mod warming;

pub use config::Config;
pub use context::CacheContext;
pub use error::{CacheError, Result};
