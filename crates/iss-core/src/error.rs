//! Error types for the epoch store.
//!
//! Every query and load failure is reported through [`StoreError`]. No
//! variant carries a partial result; a miss is a miss.

use iss_cache::CacheError;
use iss_types::{Timestamp, TimestampError};

/// Errors that can occur while loading or querying the dataset.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The origin could not be reached or did not answer with success.
    #[error("origin unavailable: {0}")]
    OriginUnavailable(String),

    /// A caller-supplied timestamp does not match `YYYY-DDDTHH:MM:SS.fZ`.
    #[error("The time provided is not in the correct format: {0}")]
    MalformedTimestamp(#[from] TimestampError),

    /// No epoch has exactly the requested timestamp.
    #[error("There is no epoch in the dataset whose time perfectly matches {0}")]
    EpochNotFound(Timestamp),

    /// A window parameter is not a non-negative integer.
    #[error("Invalid {name} parameter {value:?}: {name} must be a non-negative integer")]
    InvalidParameter {
        /// Which parameter was rejected (`offset` or `limit`).
        name: &'static str,
        /// The rejected input text.
        value: String,
    },

    /// A nearest-time search ran against a dataset with no epochs.
    #[error("the dataset holds no epochs")]
    EmptyDataset,

    /// The origin document could not be translated into a dataset.
    #[error("malformed origin dataset: {0}")]
    MalformedDataset(String),

    /// The external cache failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}
