//! The full trajectory dataset: declared coverage plus ordered epochs.
//!
//! A [`Dataset`] is built once per process, either from the origin
//! document or from the cache blob, and never mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::epoch::Epoch;
use crate::timestamp::{TimeParts, Timestamp};

/// Segment metadata declared by the origin.
///
/// `start_time` and `stop_time` are the coverage bounds the origin
/// advertises. They are not derived from the epoch sequence and may sit
/// slightly outside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Declared start of coverage (`START_TIME`).
    pub start_time: Timestamp,
    /// Declared end of coverage (`STOP_TIME`).
    pub stop_time: Timestamp,
    /// Every other metadata field (`OBJECT_NAME`, `REF_FRAME`, ...) as text.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Coverage metadata plus the epoch sequence, sorted ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Segment metadata.
    pub metadata: DatasetMetadata,
    /// Epochs in strictly ascending timestamp order.
    pub epochs: Vec<Epoch>,
}

impl Dataset {
    /// Number of epochs.
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    /// Whether the dataset holds no epochs.
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Whether every adjacent pair satisfies `timestamp[i] < timestamp[i + 1]`.
    pub fn is_strictly_ordered(&self) -> bool {
        self.epochs
            .windows(2)
            .all(|pair| matches!(pair, [a, b] if a.timestamp < b.timestamp))
    }
}

/// Presentation form of the declared coverage bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Components of `START_TIME`.
    pub start: TimeParts,
    /// Components of `STOP_TIME`.
    pub stop: TimeParts,
    /// One-sentence description of the range.
    pub summary: String,
}

impl TimeRange {
    /// Build the presentation form from dataset metadata.
    pub fn from_metadata(metadata: &DatasetMetadata) -> Self {
        let start = metadata.start_time.parts();
        let stop = metadata.stop_time.parts();
        let summary = format!(
            "The data ranges from the {} day of {} at {} to the {} day of {} at {}",
            ordinal(start.day_of_year),
            start.year,
            start.time_of_day,
            ordinal(stop.day_of_year),
            stop.year,
            stop.time_of_day,
        );
        Self {
            start,
            stop,
            summary,
        }
    }
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st, ...
fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
