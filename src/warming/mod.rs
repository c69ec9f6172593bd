//! Warming Module
//!
//! Data source boundary and preloading of known access patterns.

mod preload;
mod source;

pub use preload::{PreloadTarget, Preloader};
pub use source::{DataSource, DataSources, MemorySource};
