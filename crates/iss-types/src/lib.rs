//! Shared type definitions for the ISS trajectory service.
//!
//! This crate is the single source of truth for the data that flows
//! between the origin translation, the cache, the epoch store, and the
//! HTTP layer. Everything downstream of the origin document operates on
//! these typed forms.
//!
//! # Modules
//!
//! - [`timestamp`] -- Fixed-format UTC timestamps (`YYYY-DDDTHH:MM:SS.fffZ`)
//! - [`epoch`] -- A single state-vector sample (position + velocity)
//! - [`dataset`] -- The full ordered epoch sequence plus coverage metadata

pub mod dataset;
pub mod epoch;
pub mod timestamp;

// Re-export all public types at crate root for convenience.
pub use dataset::{Dataset, DatasetMetadata, TimeRange};
pub use epoch::{Epoch, POSITION_UNITS, VELOCITY_UNITS, Vector3};
pub use timestamp::{TimeParts, Timestamp, TimestampError};
