//! Process-local cache with the same get/set contract as Redis.
//!
//! Used when no Redis URL is configured and by tests. Contents live only
//! as long as the process, so every start goes to the origin once.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

/// In-memory key-value map shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the value at `key`.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    /// Store `value` at `key`, replacing any previous value.
    pub async fn set(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no keys are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty().await);
        cache.set("a", "1").await;
        assert_eq!(cache.get("a").await.as_deref(), Some("1"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let cache = MemoryCache::new();
        let clone = cache.clone();
        clone.set("a", "1").await;
        assert_eq!(cache.get("a").await.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let cache = MemoryCache::new();
        cache.set("a", "1").await;
        cache.set("a", "2").await;
        assert_eq!(cache.get("a").await.as_deref(), Some("2"));
        assert_eq!(cache.len().await, 1);
    }
}
