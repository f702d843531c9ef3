//! The epoch store: one shared, read-only, time-ordered sequence.
//!
//! Every query first makes sure the dataset is loaded. Loading is
//! single-flight: the dataset lives in a [`OnceCell`], so concurrent
//! first callers await one load instead of racing duplicate origin
//! fetches and cache writes. A failed load leaves the cell empty and the
//! next query tries again.
//!
//! After loading, queries are lock-free reads against the cell's
//! contents and return borrows into it rather than copies.

use std::num::IntErrorKind;

use chrono::{DateTime, Utc};
use iss_types::{Dataset, Epoch, TimeRange, Timestamp, VELOCITY_UNITS};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::StoreError;
use crate::index::TemporalIndex;
use crate::loader::Loader;

/// Offset/limit selection over the ordered epochs.
///
/// The selection is `[offset, offset + limit)`, clamped to the sequence:
/// it never errors on overrun and never wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    /// Rank of the first epoch returned, 0-based.
    pub offset: usize,
    /// Maximum number of epochs; `None` means the whole remaining tail.
    pub limit: Option<usize>,
}

impl Window {
    /// Build a window from raw query-string values.
    ///
    /// A missing `offset` means 0 and a missing `limit` means "everything
    /// after `offset`".
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidParameter`] if a present value is not
    /// a non-negative integer.
    pub fn parse(offset: Option<&str>, limit: Option<&str>) -> Result<Self, StoreError> {
        Ok(Self {
            offset: offset
                .map(|text| parse_count("offset", text))
                .transpose()?
                .unwrap_or(0),
            limit: limit.map(|text| parse_count("limit", text)).transpose()?,
        })
    }

    /// The selected sub-slice of `items`.
    pub fn apply<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset.min(items.len());
        let end = self
            .limit
            .map_or(items.len(), |limit| start.saturating_add(limit))
            .min(items.len());
        items.get(start..end).unwrap_or_default()
    }
}

/// A count too large for `usize` saturates; the window clamps it anyway.
fn parse_count(name: &'static str, text: &str) -> Result<usize, StoreError> {
    match text.trim().parse::<usize>() {
        Ok(count) => Ok(count),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(usize::MAX),
        Err(_) => Err(StoreError::InvalidParameter {
            name,
            value: text.to_owned(),
        }),
    }
}

/// Speed of an epoch, as returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Speed {
    /// Magnitude of the velocity vector.
    pub speed: f64,
    /// Always `km/s`.
    pub unit: &'static str,
}

impl Speed {
    /// The speed of `epoch`.
    pub fn of(epoch: &Epoch) -> Self {
        Self {
            speed: epoch.speed(),
            unit: VELOCITY_UNITS,
        }
    }
}

/// Owner of the dataset and entry point for every query.
pub struct EpochStore {
    loader: Loader,
    dataset: OnceCell<Dataset>,
}

impl EpochStore {
    /// Create an empty store. Nothing is loaded until the first query or
    /// an explicit [`ensure_loaded`](Self::ensure_loaded).
    pub const fn new(loader: Loader) -> Self {
        Self {
            loader,
            dataset: OnceCell::const_new(),
        }
    }

    /// Load the dataset if that has not happened yet, and return it.
    ///
    /// Idempotent: after the first success, calls return the same dataset
    /// without touching the cache or the origin.
    ///
    /// # Errors
    ///
    /// Propagates any [`Loader::load`] failure. The store stays unloaded.
    pub async fn ensure_loaded(&self) -> Result<&Dataset, StoreError> {
        self.dataset.get_or_try_init(|| self.loader.load()).await
    }

    /// Whether the dataset has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.dataset.initialized()
    }

    /// The loader backing this store.
    pub const fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Epochs selected by `window`, in timestamp order.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn list_window(&self, window: Window) -> Result<&[Epoch], StoreError> {
        let dataset = self.ensure_loaded().await?;
        let selected = window.apply(&dataset.epochs);
        debug!(
            offset = window.offset,
            limit = window.limit,
            returned = selected.len(),
            "list_window"
        );
        Ok(selected)
    }

    /// The epoch whose timestamp equals `timestamp_text` exactly.
    ///
    /// A nearby epoch is never substituted for a missing one.
    ///
    /// # Errors
    ///
    /// - [`StoreError::MalformedTimestamp`] if the text does not parse.
    /// - [`StoreError::EpochNotFound`] if no epoch matches exactly.
    /// - Load failures.
    pub async fn get_exact(&self, timestamp_text: &str) -> Result<&Epoch, StoreError> {
        let dataset = self.ensure_loaded().await?;
        let timestamp: Timestamp = timestamp_text.parse()?;
        TemporalIndex::new(&dataset.epochs)
            .find_exact(timestamp)
            .and_then(|index| dataset.epochs.get(index))
            .ok_or(StoreError::EpochNotFound(timestamp))
    }

    /// Speed at the epoch whose timestamp equals `timestamp_text` exactly.
    ///
    /// # Errors
    ///
    /// Same as [`get_exact`](Self::get_exact).
    pub async fn get_speed(&self, timestamp_text: &str) -> Result<Speed, StoreError> {
        let epoch = self.get_exact(timestamp_text).await?;
        Ok(Speed::of(epoch))
    }

    /// The epoch closest in time to `instant`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyDataset`] if the dataset holds no epochs.
    /// - Load failures.
    pub async fn get_nearest(&self, instant: DateTime<Utc>) -> Result<&Epoch, StoreError> {
        let dataset = self.ensure_loaded().await?;
        let epoch = TemporalIndex::new(&dataset.epochs).nearest_epoch(instant)?;
        debug!(%instant, nearest = %epoch.timestamp, "get_nearest");
        Ok(epoch)
    }

    /// The dataset's declared coverage, split for presentation.
    ///
    /// Uses the `START_TIME`/`STOP_TIME` metadata, not the first and last
    /// epochs.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn time_range_summary(&self) -> Result<TimeRange, StoreError> {
        let dataset = self.ensure_loaded().await?;
        Ok(TimeRange::from_metadata(&dataset.metadata))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::lossy_float_literal,
    clippy::excessive_precision
)]
mod tests {
    use std::sync::Arc;

    use iss_cache::{DatasetCache, MemoryCache};

    use super::*;
    use crate::loader::DATASET_CACHE_KEY;
    use crate::origin::{Origin, StaticOrigin};

    const SAMPLE: &str = include_str!("../../../testdata/iss_oem_sample.xml");

    fn store_with(cache: &MemoryCache, payload: &str) -> EpochStore {
        EpochStore::new(Loader::new(
            Origin::from(StaticOrigin::new(payload)),
            DatasetCache::from(cache.clone()),
        ))
    }

    fn sample_store() -> EpochStore {
        store_with(&MemoryCache::new(), SAMPLE)
    }

    fn instant(text: &str) -> DateTime<Utc> {
        text.parse::<Timestamp>().unwrap().as_datetime()
    }

    // -- Window parsing ------------------------------------------------------

    #[test]
    fn window_defaults() {
        let window = Window::parse(None, None).unwrap();
        assert_eq!(window, Window::default());
        assert_eq!(window.apply(&[1, 2, 3]), &[1, 2, 3]);
    }

    #[test]
    fn window_rejects_non_integers() {
        for (offset, limit, name) in [
            (Some("abc"), None, "offset"),
            (None, Some("1.5"), "limit"),
            (Some("-1"), None, "offset"),
            (None, Some("-3"), "limit"),
            (None, Some(""), "limit"),
        ] {
            let err = Window::parse(offset, limit).unwrap_err();
            match err {
                StoreError::InvalidParameter { name: got, .. } => assert_eq!(got, name),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn window_is_exclusive_of_upper_bound() {
        let items: Vec<u32> = (0..10).collect();
        let window = Window::parse(Some("1"), Some("1")).unwrap();
        assert_eq!(window.apply(&items), &[1]);
        let window = Window::parse(Some("2"), Some("3")).unwrap();
        assert_eq!(window.apply(&items), &[2, 3, 4]);
    }

    #[test]
    fn window_clamps_to_tail() {
        let items: Vec<u32> = (0..5).collect();
        assert_eq!(
            Window::parse(Some("3"), Some("10000000000")).unwrap().apply(&items),
            &[3, 4]
        );
        assert!(Window::parse(Some("5"), None).unwrap().apply(&items).is_empty());
        assert!(Window::parse(Some("99"), Some("1")).unwrap().apply(&items).is_empty());
        assert!(Window::parse(None, Some("0")).unwrap().apply(&items).is_empty());
    }

    #[test]
    fn window_counts_beyond_usize_saturate() {
        let items: Vec<u32> = (0..5).collect();
        let huge = "99999999999999999999";
        assert_eq!(
            Window::parse(Some("0"), Some(huge)).unwrap().apply(&items),
            &[0, 1, 2, 3, 4]
        );
        assert!(Window::parse(Some(huge), None).unwrap().apply(&items).is_empty());
        assert_eq!(
            Window::parse(Some("+1"), Some(huge)).unwrap().apply(&items),
            &[1, 2, 3, 4]
        );
        assert!(Window::parse(Some("-99999999999999999999"), None).is_err());
    }

    #[test]
    fn window_limit_near_usize_max_does_not_overflow() {
        let items: Vec<u32> = (0..5).collect();
        let window = Window {
            offset: 2,
            limit: Some(usize::MAX),
        };
        assert_eq!(window.apply(&items), &[2, 3, 4]);
    }

    #[test]
    fn window_length_matches_min_of_limit_and_remaining() {
        let items: Vec<u32> = (0..7).collect();
        for offset in 0..9_usize {
            for limit in 0..9_usize {
                let window = Window {
                    offset,
                    limit: Some(limit),
                };
                let selected = window.apply(&items);
                let expected = limit.min(items.len().saturating_sub(offset));
                assert_eq!(selected.len(), expected, "offset {offset} limit {limit}");
                if let Some(first) = selected.first() {
                    assert_eq!(usize::try_from(*first).unwrap(), offset);
                }
            }
        }
    }

    // -- Store queries -------------------------------------------------------

    #[tokio::test]
    async fn list_window_returns_contiguous_ordered_run() {
        let store = sample_store();
        let all = store.list_window(Window::default()).await.unwrap();
        assert_eq!(all.len(), 4);
        for pair in all.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }

        let window = Window::parse(Some("1"), Some("2")).unwrap();
        let selected = store.list_window(window).await.unwrap();
        assert_eq!(selected, &all[1..3]);
    }

    #[tokio::test]
    async fn get_exact_round_trips_every_epoch() {
        let store = sample_store();
        let all = store.list_window(Window::default()).await.unwrap();
        for epoch in all {
            let found = store.get_exact(&epoch.timestamp.to_string()).await.unwrap();
            assert_eq!(found, epoch);
        }
    }

    #[tokio::test]
    async fn get_exact_rejects_malformed_text() {
        let store = sample_store();
        let err = store.get_exact("a_bad_time_format").await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedTimestamp(_)));
    }

    #[tokio::test]
    async fn get_exact_never_substitutes_a_neighbor() {
        let store = sample_store();
        let err = store.get_exact("2000-001T00:00:00.001Z").await.unwrap_err();
        assert!(matches!(err, StoreError::EpochNotFound(_)));

        // One millisecond after a real epoch is still a miss.
        let err = store.get_exact("2025-104T12:04:00.001Z").await.unwrap_err();
        assert!(matches!(err, StoreError::EpochNotFound(_)));
    }

    #[tokio::test]
    async fn get_speed_is_velocity_norm() {
        let store = sample_store();
        let speed = store.get_speed("2025-104T12:00:00.000Z").await.unwrap();
        let expected = (2.308_531_832_528_580_2_f64.powi(2)
            + 4.529_965_028_925_209_6_f64.powi(2)
            + 5.734_111_658_501_38_f64.powi(2))
        .sqrt();
        assert!((speed.speed - expected).abs() < 1e-12);
        assert!((speed.speed - 7.6186).abs() < 1e-4);
        assert_eq!(speed.unit, "km/s");
    }

    #[tokio::test]
    async fn get_speed_propagates_lookup_errors() {
        let store = sample_store();
        assert!(matches!(
            store.get_speed("nope").await.unwrap_err(),
            StoreError::MalformedTimestamp(_)
        ));
        assert!(matches!(
            store.get_speed("2000-001T00:00:00.001Z").await.unwrap_err(),
            StoreError::EpochNotFound(_)
        ));
    }

    #[tokio::test]
    async fn get_nearest_uses_caller_instant() {
        let store = sample_store();
        let cases = [
            ("2025-001T00:00:00.000Z", "2025-104T12:00:00.000Z"),
            ("2025-104T12:01:59.000Z", "2025-104T12:00:00.000Z"),
            ("2025-104T12:02:01.000Z", "2025-104T12:04:00.000Z"),
            ("2025-104T12:08:00.000Z", "2025-104T12:08:00.000Z"),
            ("2025-104T12:10:30.000Z", "2025-104T12:12:00.000Z"),
            ("2026-290T00:00:00.000Z", "2025-104T12:12:00.000Z"),
        ];
        for (query, expected) in cases {
            let epoch = store.get_nearest(instant(query)).await.unwrap();
            assert_eq!(epoch.timestamp.to_string(), expected, "query {query}");
        }
    }

    #[tokio::test]
    async fn get_nearest_on_empty_dataset() {
        let empty = "<ndm><oem><body><segment><metadata>\
                     <START_TIME>2025-001T00:00:00.000Z</START_TIME>\
                     <STOP_TIME>2025-002T00:00:00.000Z</STOP_TIME>\
                     </metadata><data></data></segment></body></oem></ndm>";
        let store = store_with(&MemoryCache::new(), empty);
        let err = store.get_nearest(Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyDataset));
    }

    #[tokio::test]
    async fn time_range_comes_from_metadata() {
        let store = sample_store();
        let range = store.time_range_summary().await.unwrap();
        assert_eq!(range.start.year, 2025);
        assert_eq!(range.start.day_of_year, 104);
        assert_eq!(range.stop.day_of_year, 119);
        assert_eq!(range.stop.time_of_day, "12:00:00.000");
    }

    // -- Loading discipline --------------------------------------------------

    #[tokio::test]
    async fn ensure_loaded_is_idempotent() {
        let store = sample_store();
        assert!(!store.is_loaded());

        let first = store.ensure_loaded().await.unwrap().clone();
        let second = store.ensure_loaded().await.unwrap();

        assert!(store.is_loaded());
        assert_eq!(store.loader().origin_fetches(), 1);
        assert_eq!(&first, second);
    }

    #[tokio::test]
    async fn prepopulated_cache_means_zero_fetches() {
        let cache = MemoryCache::new();
        store_with(&cache, SAMPLE).ensure_loaded().await.unwrap();

        let store = store_with(&cache, SAMPLE);
        store.ensure_loaded().await.unwrap();
        store.ensure_loaded().await.unwrap();
        assert_eq!(store.loader().origin_fetches(), 0);
    }

    #[tokio::test]
    async fn queries_load_lazily() {
        let cache = MemoryCache::new();
        let store = store_with(&cache, SAMPLE);
        assert!(cache.get(DATASET_CACHE_KEY).await.is_none());

        store.get_exact("2025-104T12:04:00.000Z").await.unwrap();
        assert!(store.is_loaded());
        assert!(cache.get(DATASET_CACHE_KEY).await.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_callers_share_one_load() {
        let store = Arc::new(sample_store());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.ensure_loaded().await.map(Dataset::len) })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            assert_eq!(result.unwrap().unwrap(), 4);
        }
        assert_eq!(store.loader().origin_fetches(), 1);
    }

    #[tokio::test]
    async fn failed_load_leaves_store_unloaded() {
        let store = store_with(&MemoryCache::new(), "<ndm></ndm>");
        assert!(store.list_window(Window::default()).await.is_err());
        assert!(!store.is_loaded());

        // A later call tries again rather than caching the failure.
        assert!(store.list_window(Window::default()).await.is_err());
        assert_eq!(store.loader().origin_fetches(), 2);
    }
}
