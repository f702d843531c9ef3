//! Epoch store and temporal query engine for the ISS trajectory service.
//!
//! The store owns one time-ordered sequence of epochs. It is populated
//! lazily on first access through a cache-aside loader and is read-only
//! from then on.
//!
//! # Architecture
//!
//! ```text
//! EpochStore::ensure_loaded (single flight)
//!     |
//!     +-- Loader --> DatasetCache::get ----------- hit --> Dataset
//!     |               |
//!     |               +-- miss --> Origin::fetch --> oem::parse_oem
//!     |                                          --> DatasetCache::set
//!     |
//!     +-- queries: list_window / get_exact / get_speed / get_nearest
//!                  / time_range_summary
//!                      |
//!                      +-- TemporalIndex (binary search by timestamp)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- [`EpochStore`] and its query operations
//! - [`index`] -- Nearest-timestamp and exact-timestamp binary search
//! - [`loader`] -- Cache-aside population of the dataset
//! - [`origin`] -- Where the raw OEM document comes from
//! - [`oem`] -- Translation of the OEM XML document into typed data
//! - [`error`] -- Shared error types

pub mod error;
pub mod index;
pub mod loader;
pub mod oem;
pub mod origin;
pub mod store;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use index::TemporalIndex;
pub use loader::{DATASET_CACHE_KEY, Loader};
pub use origin::{DEFAULT_ORIGIN_URL, HttpOrigin, Origin, StaticOrigin};
pub use store::{EpochStore, Speed, Window};
