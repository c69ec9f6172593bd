//! Invalidation Module
//!
//! Tag and dependency based invalidation across every cache instance and the
//! host framework's revalidation hook.

mod cascade;
mod dependencies;
mod revalidate;

pub use cascade::{EntityRef, InvalidationReport, Invalidator};
pub use dependencies::{default_table, resolve, Dependency, DependencyTable};
pub use revalidate::{RecordingRevalidator, Revalidation, Revalidator, TracingRevalidator};
