//! Cache layer for the ISS trajectory service.
//!
//! The service keeps one blob, the parsed dataset, under a single fixed
//! key. Subsequent process starts read it back instead of going to the
//! origin again. Nothing here expires keys or refreshes them.
//!
//! # Backends
//!
//! ```text
//! DatasetCache
//!     |
//!     +-- Redis   (RedisCache, shared across processes)
//!     +-- Memory  (MemoryCache, process-local; tests and cache-less runs)
//! ```
//!
//! # Modules
//!
//! - [`redis`] -- Redis-backed cache over a [`fred`] client
//! - [`memory`] -- In-process map with the same contract
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod redis;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use error::CacheError;
pub use memory::MemoryCache;
pub use redis::RedisCache;

/// A key-value cache holding serialized blobs.
///
/// Uses enum dispatch instead of a trait object because async methods
/// are not dyn-compatible.
#[derive(Clone)]
pub enum DatasetCache {
    /// A Redis (or Redis-compatible) server.
    Redis(RedisCache),
    /// A process-local map.
    Memory(MemoryCache),
}

impl DatasetCache {
    /// Read the raw blob stored at `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Redis`] if the backend read fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            Self::Redis(cache) => cache.get(key).await,
            Self::Memory(cache) => Ok(cache.get(key).await),
        }
    }

    /// Store `value` at `key` with no expiration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Redis`] if the backend write fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        match self {
            Self::Redis(cache) => cache.set(key, value).await,
            Self::Memory(cache) => {
                cache.set(key, value).await;
                Ok(())
            }
        }
    }

    /// Read the blob at `key` and deserialize it from JSON.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialization`] if the blob is not valid JSON
    /// for `T`, or [`CacheError::Redis`] if the read fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key).await? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` as JSON and store it at `key` with no expiration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialization`] if serialization fails, or
    /// [`CacheError::Redis`] if the write fails.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        self.set(key, &json).await
    }

    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Redis(_) => "redis",
            Self::Memory(_) => "memory",
        }
    }
}

impl From<RedisCache> for DatasetCache {
    fn from(cache: RedisCache) -> Self {
        Self::Redis(cache)
    }
}

impl From<MemoryCache> for DatasetCache {
    fn from(cache: MemoryCache) -> Self {
        Self::Memory(cache)
    }
}
