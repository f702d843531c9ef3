//! Redis-backed dataset cache.
//!
//! Holds a single [`fred`] client. Values are written with no expiration;
//! the cache is populated once and only ever cleared externally.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `iss:oem:dataset` | JSON | Fully parsed trajectory dataset |

use fred::prelude::*;

use crate::error::CacheError;

/// Connection handle to a Redis (or Redis-compatible) instance.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    /// Connect to Redis at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if the URL cannot be parsed.
    /// Returns [`CacheError::Redis`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let config = Config::from_url(url)
            .map_err(|e| CacheError::Config(format!("Invalid Redis URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Redis");
        Ok(Self { client })
    }

    /// Read the raw value at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Redis`] if the read fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value)
    }

    /// Store `value` at `key` with no expiration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Redis`] if the write fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let _: () = self.client.set(key, value, None, None, false).await?;
        Ok(())
    }

    /// Delete a key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Redis`] if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }
}
