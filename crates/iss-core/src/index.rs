//! Binary search over a time-ordered epoch sequence.
//!
//! Two lookups are supported:
//!
//! - **exact**: the epoch whose timestamp equals the query, or nothing.
//! - **nearest**: the epoch whose timestamp minimizes the absolute time
//!   distance to an arbitrary instant.
//!
//! Both are O(log n) with O(1) extra space and hold no state between
//! calls. They rely on the sequence being strictly ascending by
//! timestamp; behavior on unsorted input is unspecified.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use iss_types::{Epoch, Timestamp};

use crate::error::StoreError;

/// Read-only search view over a sorted slice of epochs.
#[derive(Debug, Clone, Copy)]
pub struct TemporalIndex<'a> {
    epochs: &'a [Epoch],
}

impl<'a> TemporalIndex<'a> {
    /// Wrap a slice already sorted ascending by timestamp.
    pub const fn new(epochs: &'a [Epoch]) -> Self {
        Self { epochs }
    }

    /// Index of the epoch whose timestamp equals `timestamp` exactly.
    pub fn find_exact(&self, timestamp: Timestamp) -> Option<usize> {
        self.epochs
            .binary_search_by_key(&timestamp, |epoch| epoch.timestamp)
            .ok()
    }

    /// Index of the epoch closest in time to `instant`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyDataset`] if there are no epochs.
    pub fn nearest(&self, instant: DateTime<Utc>) -> Result<usize, StoreError> {
        nearest_by_key(self.epochs, instant, |epoch| epoch.timestamp.as_datetime())
    }

    /// The epoch closest in time to `instant`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyDataset`] if there are no epochs.
    pub fn nearest_epoch(&self, instant: DateTime<Utc>) -> Result<&'a Epoch, StoreError> {
        let index = self.nearest(instant)?;
        self.epochs.get(index).ok_or(StoreError::EmptyDataset)
    }
}

/// Index of the item whose key is closest in time to `instant`.
///
/// `items` must be sorted ascending by `key` with no duplicates. The
/// search narrows a `[left, right]` window by bisection, returning early
/// on an exact hit, until two adjacent candidates remain; the closer of
/// the two wins, with `right` winning a tie.
///
/// A tie needs two distinct timestamps equidistant from one instant,
/// which only happens when the instant sits exactly halfway between two
/// neighbors.
///
/// # Errors
///
/// Returns [`StoreError::EmptyDataset`] if `items` is empty.
pub fn nearest_by_key<T, F>(items: &[T], instant: DateTime<Utc>, key: F) -> Result<usize, StoreError>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let time_at = |index: usize| items.get(index).map(&key).ok_or(StoreError::EmptyDataset);

    match items.len() {
        0 => return Err(StoreError::EmptyDataset),
        1 => return Ok(0),
        _ => {}
    }

    let mut left = 0_usize;
    let mut right = items.len().saturating_sub(1);

    while right.saturating_sub(left) >= 2 {
        let mid = left.saturating_add(right.saturating_sub(left) / 2);
        match time_at(mid)?.cmp(&instant) {
            Ordering::Equal => return Ok(mid),
            Ordering::Less => left = mid,
            Ordering::Greater => right = mid,
        }
    }

    let left_distance = time_at(left)?.signed_duration_since(instant).abs();
    let right_distance = time_at(right)?.signed_duration_since(instant).abs();
    tracing::trace!(
        left,
        right,
        left_distance_ms = left_distance.num_milliseconds(),
        right_distance_ms = right_distance.num_milliseconds(),
        "nearest search narrowed to two candidates"
    );

    if left_distance < right_distance {
        Ok(left)
    } else {
        Ok(right)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;
    use iss_types::Vector3;

    use super::*;

    fn ts(text: &str) -> Timestamp {
        text.parse().unwrap()
    }

    fn epochs(texts: &[&str]) -> Vec<Epoch> {
        texts
            .iter()
            .map(|t| Epoch::new(ts(t), Vector3::default(), Vector3::default()))
            .collect()
    }

    fn instant(text: &str) -> DateTime<Utc> {
        ts(text).as_datetime()
    }

    #[test]
    fn empty_sequence_is_an_error() {
        let index = TemporalIndex::new(&[]);
        let err = index.nearest(Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::EmptyDataset));
    }

    #[test]
    fn single_element_always_wins() {
        let data = epochs(&["2025-001T00:00:00.001Z"]);
        let index = TemporalIndex::new(&data);
        for query in [
            "1990-001T00:00:00.000Z",
            "2025-001T00:00:00.001Z",
            "2025-002T01:00:00.000Z",
            "9999-365T23:59:59.999Z",
        ] {
            assert_eq!(index.nearest(instant(query)).unwrap(), 0);
        }
    }

    #[test]
    fn two_elements_boundaries() {
        let data = epochs(&["2025-001T00:00:00.000Z", "2025-002T00:00:00.000Z"]);
        let index = TemporalIndex::new(&data);
        assert_eq!(index.nearest(instant("2024-300T00:00:00.000Z")).unwrap(), 0);
        assert_eq!(index.nearest(instant("2025-200T00:00:00.000Z")).unwrap(), 1);
        assert_eq!(index.nearest(instant("2025-002T00:00:00.000Z")).unwrap(), 1);
        assert_eq!(index.nearest(instant("2025-001T00:00:00.000Z")).unwrap(), 0);
    }

    #[test]
    fn two_elements_query_shortly_after_second() {
        let data = epochs(&["2025-001T00:00:00.001Z", "2025-002T00:00:00.001Z"]);
        let index = TemporalIndex::new(&data);
        assert_eq!(index.nearest(instant("2025-002T01:00:00.000Z")).unwrap(), 1);
    }

    #[test]
    fn three_elements_picks_nearer_survivor() {
        let data = epochs(&[
            "2025-001T00:00:00.000Z",
            "2025-002T00:00:00.000Z",
            "2025-003T00:00:00.000Z",
        ]);
        let index = TemporalIndex::new(&data);
        assert_eq!(index.nearest(instant("2025-002T01:00:00.000Z")).unwrap(), 1);
        assert_eq!(index.nearest(instant("2025-002T13:00:00.000Z")).unwrap(), 2);
        assert_eq!(index.nearest(instant("2025-001T11:00:00.000Z")).unwrap(), 0);
    }

    #[test]
    fn exact_hit_short_circuits() {
        let data = epochs(&[
            "2025-001T00:00:00.000Z",
            "2025-002T00:00:00.000Z",
            "2025-003T00:00:00.000Z",
        ]);
        let index = TemporalIndex::new(&data);
        assert_eq!(index.nearest(instant("2025-002T00:00:00.000Z")).unwrap(), 1);
    }

    #[test]
    fn four_elements_narrowing() {
        let data = epochs(&[
            "2025-001T00:00:00.000Z",
            "2025-002T00:00:00.000Z",
            "2025-003T00:00:00.000Z",
            "2025-004T00:00:00.000Z",
        ]);
        let index = TemporalIndex::new(&data);
        assert_eq!(index.nearest(instant("2025-002T01:00:00.000Z")).unwrap(), 1);
        assert_eq!(index.nearest(instant("2025-003T23:00:00.000Z")).unwrap(), 3);
    }

    #[test]
    fn far_future_query_against_sparse_years() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap();

        let pair = epochs(&["2024-001T00:00:00.000Z", "2025-001T00:00:00.000Z"]);
        assert_eq!(TemporalIndex::new(&pair).nearest(now).unwrap(), 1);

        let triple = epochs(&[
            "2024-001T00:00:00.000Z",
            "2025-001T00:00:00.000Z",
            "9999-001T00:00:00.000Z",
        ]);
        assert_eq!(TemporalIndex::new(&triple).nearest(now).unwrap(), 1);
    }

    #[test]
    fn midpoint_tie_goes_right() {
        let data = epochs(&["2025-001T00:00:00.000Z", "2025-001T00:00:02.000Z"]);
        let index = TemporalIndex::new(&data);
        assert_eq!(index.nearest(instant("2025-001T00:00:01.000Z")).unwrap(), 1);
    }

    #[test]
    fn nearest_matches_linear_scan() {
        let texts: Vec<String> = (1..=50)
            .map(|minute| format!("2025-104T12:{minute:02}:00.000Z"))
            .collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let data = epochs(&refs);
        let index = TemporalIndex::new(&data);

        for seconds in (0..3_200).step_by(37) {
            let query = instant("2025-104T12:00:00.000Z") + chrono::TimeDelta::seconds(seconds);
            let expected = data
                .iter()
                .enumerate()
                .min_by_key(|(i, e)| {
                    let d = e.timestamp.as_datetime().signed_duration_since(query).abs();
                    // Prefer the later index on equal distance.
                    (d, std::cmp::Reverse(*i))
                })
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(index.nearest(query).unwrap(), expected, "query {query}");
        }
    }

    #[test]
    fn exact_lookup_requires_equality() {
        let data = epochs(&["2025-001T00:00:00.000Z", "2025-002T00:00:00.000Z"]);
        let index = TemporalIndex::new(&data);
        assert_eq!(index.find_exact(ts("2025-002T00:00:00.000Z")), Some(1));
        assert_eq!(index.find_exact(ts("2025-002T00:00:00.001Z")), None);
    }

    #[test]
    fn nearest_epoch_returns_the_element() {
        let data = epochs(&["2025-001T00:00:00.000Z", "2025-002T00:00:00.000Z"]);
        let index = TemporalIndex::new(&data);
        let epoch = index.nearest_epoch(instant("2025-002T03:00:00.000Z")).unwrap();
        assert_eq!(epoch.timestamp, ts("2025-002T00:00:00.000Z"));
    }
}
