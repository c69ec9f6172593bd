//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.
//!
//! Nothing here is fatal to the host: cache paths translate these errors into
//! a miss or a skipped item after logging them.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The external data source failed to produce an entity
    #[error("Data source '{source_name}' failed for '{id}': {message}")]
    DataSource {
        source_name: String,
        id: String,
        message: String,
    },

    /// A payload could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No cache instance is registered under the given name
    #[error("Unknown cache instance: {0}")]
    UnknownInstance(String),

    /// Configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CacheError {
    /// Builds a data source failure for the given source and entity id.
    pub fn data_source(
        source_name: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DataSource {
            source_name: source_name.into(),
            id: id.into(),
            message: message.into(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
