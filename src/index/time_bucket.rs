//! Time Bucket Index - fixed-width time windows over a tick sequence
//!
//! Groups record positions into buckets of `bucket_width` seconds so a
//! `[min, max]` query only touches the buckets that overlap the range.
//!
//! # Layout
//!
//! ```text
//! ticks:   t=0  t=5  t=9 | t=10 t=15 | t=25
//! buckets: 0 → [0, 1, 2]   10 → [3, 4]   20 → [5]
//! ```
//!
//! Keys are kept in a sorted `Vec` next to their position lists. Because
//! the source sequence is time-sorted, positions inside a bucket are also
//! time-sorted, which lets the edge buckets be cut by binary search.
//!
//! # Performance
//! - Build: O(n)
//! - Query: O(log b + log k + r) for b buckets, k ticks per edge bucket and r results

use crate::index::search::{lower_bound, lower_bound_by_key, upper_bound, upper_bound_by_key};
use crate::ticks::{TickRecord, TickSequence, TimeRange};
use std::collections::BTreeMap;

/// Default bucket width in seconds
pub const DEFAULT_BUCKET_WIDTH: u64 = 10;

/// Secondary index from bucket start (seconds) to record positions
#[derive(Debug, Clone, Default)]
pub struct TimeBucketIndex {
    bucket_width: u64,
    /// Ascending bucket starts
    keys: Vec<i64>,
    /// Positions per bucket, parallel to `keys`
    buckets: Vec<Vec<usize>>,
    indexed: usize,
    skipped: usize,
}

impl TimeBucketIndex {
    /// Build the index in a single pass over the sequence
    ///
    /// Records with a non-finite or negative timestamp are skipped. A zero
    /// bucket width falls back to [`DEFAULT_BUCKET_WIDTH`].
    pub fn build(sequence: &TickSequence, bucket_width: u64) -> Self {
        let bucket_width = if bucket_width == 0 {
            tracing::warn!(
                "Bucket width 0 is invalid, using {}s",
                DEFAULT_BUCKET_WIDTH
            );
            DEFAULT_BUCKET_WIDTH
        } else {
            bucket_width
        };

        let mut grouped: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        let mut skipped = 0;

        for (position, record) in sequence.records().iter().enumerate() {
            if !record.has_valid_time() {
                skipped += 1;
                continue;
            }

            let bucket = bucket_start(record.seconds_from_start, bucket_width);
            grouped.entry(bucket).or_default().push(position);
        }

        if skipped > 0 {
            tracing::debug!("Skipped {} ticks with malformed timestamps", skipped);
        }

        let (keys, buckets): (Vec<i64>, Vec<Vec<usize>>) = grouped.into_iter().unzip();

        tracing::debug!(
            "Built time index: {} ticks in {} buckets of {}s",
            sequence.len() - skipped,
            keys.len(),
            bucket_width
        );

        Self {
            bucket_width,
            keys,
            buckets,
            indexed: sequence.len() - skipped,
            skipped,
        }
    }

    /// Positions of all records with `min <= seconds_from_start <= max`,
    /// in sequence order
    ///
    /// Returns an empty list for reversed or NaN bounds and for an empty index.
    pub fn query_positions(&self, sequence: &TickSequence, min: f64, max: f64) -> Vec<usize> {
        if !(min <= max) || self.keys.is_empty() {
            return Vec::new();
        }

        let start_bucket = bucket_start(min, self.bucket_width);
        let end_bucket = bucket_start(max, self.bucket_width);

        // Last bucket starting at or before the range; when every bucket
        // starts later, the first one is the first candidate.
        let start_pos = upper_bound(&self.keys, &start_bucket).unwrap_or(0);
        // First bucket starting at or after the range end; past-the-end
        // means the last bucket still overlaps.
        let end_pos = lower_bound(&self.keys, &end_bucket).min(self.keys.len() - 1);

        if start_pos > end_pos {
            return Vec::new();
        }

        let records = sequence.records();
        let time_of = |position: &usize| {
            records
                .get(*position)
                .map(|r| r.seconds_from_start)
                .unwrap_or(f64::NAN)
        };

        let mut selected = Vec::new();

        for pos in start_pos..=end_pos {
            let positions = self.buckets[pos].as_slice();

            let from = if pos == start_pos {
                lower_bound_by_key(positions, min, time_of)
            } else {
                0
            };

            let to = if pos == end_pos {
                upper_bound_by_key(positions, max, time_of).map_or(0, |last| last + 1)
            } else {
                positions.len()
            };

            if from < to {
                selected.extend_from_slice(&positions[from..to]);
            }
        }

        selected
    }

    /// Records with `min <= seconds_from_start <= max`, in sequence order
    pub fn query(&self, sequence: &TickSequence, min: f64, max: f64) -> Vec<TickRecord> {
        self.query_positions(sequence, min, max)
            .into_iter()
            .filter_map(|position| sequence.get(position).copied())
            .collect()
    }

    /// Query with a [`TimeRange`]
    pub fn query_range(&self, sequence: &TickSequence, range: &TimeRange) -> Vec<TickRecord> {
        self.query(sequence, range.min, range.max)
    }

    pub fn bucket_width(&self) -> u64 {
        self.bucket_width
    }

    pub fn bucket_count(&self) -> usize {
        self.keys.len()
    }

    /// Bucket starts in ascending order
    pub fn keys(&self) -> &[i64] {
        &self.keys
    }

    /// Positions stored under a bucket start
    pub fn bucket(&self, start: i64) -> Option<&[usize]> {
        self.keys
            .binary_search(&start)
            .ok()
            .map(|pos| self.buckets[pos].as_slice())
    }

    /// Iterate `(bucket_start, positions)` in ascending order
    pub fn buckets(&self) -> impl Iterator<Item = (i64, &[usize])> {
        self.keys
            .iter()
            .copied()
            .zip(self.buckets.iter().map(Vec::as_slice))
    }

    /// Number of records placed in a bucket
    pub fn indexed_len(&self) -> usize {
        self.indexed
    }

    /// Number of records skipped for malformed timestamps
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// First and last bucket starts
    pub fn key_range(&self) -> Option<(i64, i64)> {
        Some((*self.keys.first()?, *self.keys.last()?))
    }
}

/// Start of the bucket containing `seconds`
fn bucket_start(seconds: f64, bucket_width: u64) -> i64 {
    // `as` saturates, so infinite bounds land on i64::MIN / i64::MAX
    let bucket = (seconds / bucket_width as f64).floor() as i64;
    bucket.saturating_mul(bucket_width as i64)
}
