//! Data Sources
//!
//! The async boundary to the data-access layer. The cache treats every source
//! as opaque and never retries a failed fetch.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{CacheError, Result};

// == Data Source ==
/// Fetches one entity (or one aggregate) by id.
///
/// `Ok(None)` means the entity does not exist; `Err` means the fetch failed.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Option<Value>>;
}

// == Data Sources ==
/// The per-domain sources the preloader draws from.
#[derive(Clone)]
pub struct DataSources {
    /// User profile by user id
    pub users: Arc<dyn DataSource>,
    /// Project list (JSON array) by owner id
    pub user_projects: Arc<dyn DataSource>,
    /// Project statistics by owner id
    pub user_stats: Arc<dyn DataSource>,
    /// Project details by project id
    pub projects: Arc<dyn DataSource>,
}

// == Memory Source ==
/// A map-backed source, used by the demo binary and in tests.
///
/// Ids can be marked as failing to simulate a broken backend.
#[derive(Debug, Default)]
pub struct MemorySource {
    name: String,
    records: RwLock<HashMap<String, Value>>,
    failing: RwLock<HashSet<String>>,
    fetches: AtomicU64,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with(self, id: impl Into<String>, value: Value) -> Self {
        self.insert(id, value);
        self
    }

    pub fn insert(&self, id: impl Into<String>, value: Value) {
        self.records.write().insert(id.into(), value);
    }

    pub fn remove(&self, id: &str) {
        self.records.write().remove(id);
    }

    /// Makes every fetch of `id` fail until [`recover`](Self::recover) is called.
    pub fn fail_on(&self, id: impl Into<String>) {
        self.failing.write().insert(id.into());
    }

    pub fn recover(&self, id: &str) {
        self.failing.write().remove(id);
    }

    /// Total fetches served, failed ones included.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch(&self, id: &str) -> Result<Option<Value>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if self.failing.read().contains(id) {
            return Err(CacheError::data_source(&self.name, id, "simulated failure"));
        }
        Ok(self.records.read().get(id).cloned())
    }
}
