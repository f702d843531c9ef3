//! ISS tracker entry point.
//!
//! Serves the International Space Station's published trajectory over
//! HTTP. The dataset is read once per process from the cache, or from
//! the origin when the cache has nothing.
//!
//! # Architecture
//!
//! ```text
//! env --> AppConfig --> DatasetCache (Redis | in-process)
//!                   --> Origin (HTTP | local file)
//!                   --> Loader --> EpochStore --> AppState --> Axum router
//! ```

use std::sync::Arc;

use anyhow::Context;
use iss_api::{AppConfig, AppState, OriginSource, start_server};
use iss_cache::{DatasetCache, MemoryCache, RedisCache};
use iss_core::{EpochStore, HttpOrigin, Loader, Origin, StaticOrigin};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// connects the cache, prepares the origin, optionally warms the store,
/// then serves HTTP until `Ctrl-C`.
///
/// # Errors
///
/// Returns an error if configuration, cache connection, origin setup or
/// the server fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("iss-tracker starting");

    let config = AppConfig::from_env().context("loading configuration")?;
    info!(
        host = config.server.host,
        port = config.server.port,
        origin = ?config.origin,
        origin_timeout_ms = config.origin_timeout.as_millis(),
        redis = config.redis_url.is_some(),
        eager_load = config.eager_load,
        "configuration loaded"
    );

    let cache = build_cache(&config).await?;
    let origin = build_origin(&config).await?;
    let store = EpochStore::new(Loader::new(origin, cache));

    if config.eager_load {
        match store.ensure_loaded().await {
            Ok(dataset) => info!(epochs = dataset.len(), "Dataset ready"),
            Err(e) => warn!(error = %e, "Initial dataset load failed, will retry on first request"),
        }
    }

    let state = Arc::new(AppState::new(store));
    start_server(&config.server, state)
        .await
        .context("running API server")?;

    Ok(())
}

async fn build_cache(config: &AppConfig) -> anyhow::Result<DatasetCache> {
    let cache = match &config.redis_url {
        Some(url) => DatasetCache::from(
            RedisCache::connect(url)
                .await
                .context("connecting to Redis")?,
        ),
        None => {
            info!("REDIS_URL not set, using in-process cache");
            DatasetCache::from(MemoryCache::new())
        }
    };
    info!(backend = cache.name(), "cache ready");
    Ok(cache)
}

async fn build_origin(config: &AppConfig) -> anyhow::Result<Origin> {
    let origin = match &config.origin {
        OriginSource::Url(url) => Origin::from(
            HttpOrigin::new(url.as_str(), config.origin_timeout)
                .context("building HTTP origin")?,
        ),
        OriginSource::File(path) => Origin::from(
            StaticOrigin::from_file(path)
                .await
                .with_context(|| format!("reading dataset file {}", path.display()))?,
        ),
    };
    info!(origin = %origin.describe(), "origin ready");
    Ok(origin)
}
