//! External Revalidation Hook
//!
//! Boundary to the host framework's own page/route cache. The invalidation
//! layer calls it synchronously, once per tag or path per invalidation event.

use parking_lot::Mutex;
use tracing::info;

// == Revalidator ==
/// Receiver of tag- and path-level revalidation signals.
pub trait Revalidator: Send + Sync {
    fn revalidate_tag(&self, tag: &str);
    fn revalidate_path(&self, path: &str);
}

// == Tracing Revalidator ==
/// Logs every signal; used when no framework cache is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRevalidator;

impl Revalidator for TracingRevalidator {
    fn revalidate_tag(&self, tag: &str) {
        info!(tag = %tag, "Revalidate tag");
    }

    fn revalidate_path(&self, path: &str) {
        info!(path = %path, "Revalidate path");
    }
}

// == Recording Revalidator ==
/// One signal sent to the revalidation hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revalidation {
    Tag(String),
    Path(String),
}

/// Keeps every signal in order, for assertions and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingRevalidator {
    events: Mutex<Vec<Revalidation>>,
}

impl RecordingRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Revalidation> {
        self.events.lock().clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Revalidation::Tag(tag) => Some(tag.clone()),
                Revalidation::Path(_) => None,
            })
            .collect()
    }

    pub fn paths(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Revalidation::Path(path) => Some(path.clone()),
                Revalidation::Tag(_) => None,
            })
            .collect()
    }

    /// How many times `tag` was signalled.
    pub fn tag_count(&self, tag: &str) -> usize {
        self.tags().iter().filter(|t| *t == tag).count()
    }

    pub fn reset(&self) {
        self.events.lock().clear();
    }
}

impl Revalidator for RecordingRevalidator {
    fn revalidate_tag(&self, tag: &str) {
        self.events.lock().push(Revalidation::Tag(tag.to_string()));
    }

    fn revalidate_path(&self, path: &str) {
        self.events.lock().push(Revalidation::Path(path.to_string()));
    }
}
