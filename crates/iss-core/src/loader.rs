//! Cache-aside population of the dataset.
//!
//! ```text
//! load()
//!   |-- cache hit  --> deserialize blob --> Dataset       (no origin fetch)
//!   +-- cache miss --> Origin::fetch --> parse_oem --> DatasetCache::set --> Dataset
//! ```
//!
//! The blob under [`DATASET_CACHE_KEY`] is the already-normalized
//! [`Dataset`] as JSON, so a hit skips XML parsing entirely. It is written
//! with no expiration. A blob that no longer deserializes is treated as a
//! miss and overwritten.
//!
//! [`Loader::load`] is not guarded on its own. [`EpochStore`] wraps it in a
//! single-flight cell so it runs at most once per process.
//!
//! [`EpochStore`]: crate::store::EpochStore

use std::sync::atomic::{AtomicU64, Ordering};

use iss_cache::{CacheError, DatasetCache};
use iss_types::Dataset;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::oem::parse_oem;
use crate::origin::Origin;

/// Fixed cache key for the whole dataset.
pub const DATASET_CACHE_KEY: &str = "iss:oem:dataset";

/// Reads the dataset from the cache, falling back to the origin.
pub struct Loader {
    origin: Origin,
    cache: DatasetCache,
    origin_fetches: AtomicU64,
}

impl Loader {
    /// Create a loader over the given origin and cache.
    pub const fn new(origin: Origin, cache: DatasetCache) -> Self {
        Self {
            origin,
            cache,
            origin_fetches: AtomicU64::new(0),
        }
    }

    /// Number of origin fetches attempted so far.
    pub fn origin_fetches(&self) -> u64 {
        self.origin_fetches.load(Ordering::Relaxed)
    }

    /// Produce the dataset from the cache, or from the origin on a miss.
    ///
    /// On a miss the parsed dataset is written back to the cache before
    /// returning.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Cache`] if the cache cannot be read or written.
    /// - [`StoreError::OriginUnavailable`] if the origin fetch fails.
    /// - [`StoreError::MalformedDataset`] if the origin document is invalid.
    pub async fn load(&self) -> Result<Dataset, StoreError> {
        match self.cache.get_json::<Dataset>(DATASET_CACHE_KEY).await {
            Ok(Some(dataset)) => {
                info!(
                    backend = self.cache.name(),
                    epochs = dataset.len(),
                    "Dataset loaded from cache"
                );
                return Ok(dataset);
            }
            Ok(None) => {
                info!(backend = self.cache.name(), "Dataset not cached, fetching from origin");
            }
            Err(CacheError::Serialization(e)) => {
                warn!(error = %e, "Cached dataset is unreadable, fetching from origin");
            }
            Err(e) => return Err(e.into()),
        }

        self.origin_fetches.fetch_add(1, Ordering::Relaxed);
        let payload = self.origin.fetch().await?;
        let dataset = parse_oem(&payload)?;

        self.cache.set_json(DATASET_CACHE_KEY, &dataset).await?;
        info!(
            origin = %self.origin.describe(),
            backend = self.cache.name(),
            epochs = dataset.len(),
            "Dataset fetched from origin and cached"
        );

        Ok(dataset)
    }
}
