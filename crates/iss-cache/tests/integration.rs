//! Integration tests for the Redis cache backend.
//!
//! These tests require a live Redis instance. Run with:
//!
//! ```bash
//! docker run -d -p 6379:6379 redis:7
//! cargo test -p iss-cache -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use iss_cache::{DatasetCache, RedisCache};
use serde::{Deserialize, Serialize};

/// Redis connection URL for the local Docker instance.
const REDIS_URL: &str = "redis://localhost:6379";

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Blob {
    label: String,
    values: Vec<f64>,
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn redis_set_and_get_raw() {
    let cache = RedisCache::connect(REDIS_URL)
        .await
        .expect("Failed to connect to Redis -- is it running?");

    let key = "iss:test:raw";
    cache.set(key, "hello").await.expect("set failed");
    let value = cache.get(key).await.expect("get failed");
    assert_eq!(value.as_deref(), Some("hello"));

    cache.delete(key).await.expect("delete failed");
    assert!(cache.get(key).await.expect("get failed").is_none());
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn redis_json_round_trip() {
    let cache = DatasetCache::from(
        RedisCache::connect(REDIS_URL)
            .await
            .expect("Failed to connect to Redis"),
    );

    let key = "iss:test:json";
    let blob = Blob {
        label: "state".to_owned(),
        values: vec![-2.5, 4.25, 5.0],
    };
    cache.set_json(key, &blob).await.unwrap();
    let back: Option<Blob> = cache.get_json(key).await.unwrap();
    assert_eq!(back, Some(blob));

    if let DatasetCache::Redis(redis) = &cache {
        redis.delete(key).await.unwrap();
    }
}

#[tokio::test]
#[ignore = "requires live Redis instance"]
async fn redis_missing_key_is_none() {
    let cache = RedisCache::connect(REDIS_URL).await.unwrap();
    assert!(cache.get("iss:test:never-written").await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_url_is_config_error() {
    let err = RedisCache::connect("not a url").await.err().unwrap();
    assert!(matches!(err, iss_cache::CacheError::Config(_)));
}
