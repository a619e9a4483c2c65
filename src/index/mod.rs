//! Tickscope Index Structures
//!
//! - **search**: lower/upper bound binary search over sorted slices
//! - **TimeBucketIndex**: fixed-width time buckets for range queries
//!
//! # Architecture
//!
//! ```text
//! Query: "ticks between 7s and 16s"
//!        ↓
//! Bucket keys [0, 10, 20]: upper_bound(0) .. lower_bound(10) → buckets 0, 10
//!        ↓
//! Edge buckets: binary search positions by seconds_from_start
//!        ↓
//! Positions [2, 3, 4] → records t=9, t=10, t=15
//! ```

pub mod search;
mod time_bucket;

pub use search::{lower_bound, lower_bound_by_key, upper_bound, upper_bound_by_key};
pub use time_bucket::{TimeBucketIndex, DEFAULT_BUCKET_WIDTH};
