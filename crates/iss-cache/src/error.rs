//! Error types for the cache layer.
//!
//! All errors are propagated via [`CacheError`] which wraps the underlying
//! [`fred`] and [`serde_json`] errors.

/// Errors that can occur in the cache layer.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A Redis operation failed.
    #[error("Redis error: {0}")]
    Redis(#[from] fred::error::Error),

    /// A stored blob could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The cache connection is misconfigured.
    #[error("Configuration error: {0}")]
    Config(String),
}
