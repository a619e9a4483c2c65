//! # Tickscope
//!
//! Tick data explorer - time-range queries, histograms and summary
//! statistics over recorded market tick sessions.
//!
//! ## Features
//!
//! - **Time bucket index**: range queries touch only the buckets that overlap
//! - **Adaptive histograms**: equal-width bins, sampled on large inputs
//! - **Per-file cache**: each file is loaded and indexed once
//! - **Pluggable loaders**: mock sessions or a directory of CSV files
//!
//! ## Modules
//!
//! - [`ticks`]: Tick records, sequences and time ranges
//! - [`index`]: Binary search helpers and the time bucket index
//! - [`analytics`]: Histograms, summary statistics and spreads
//! - [`loader`]: Tick sources
//! - [`cache`]: Data cache and async store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tickscope::{Config, MockLoader, TickField, TickStore, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = TickStore::new(Arc::new(MockLoader::new()), &Config::default());
//!
//!     // Ticks between 7s and 16s of the session
//!     let ticks = store
//!         .query("GLBX-20250227-P8LQFHG7JM", &TimeRange::new(7.0, 16.0))
//!         .await?;
//!     println!("{} ticks in range", ticks.len());
//!
//!     // Price distribution over the same window
//!     let histograms = store
//!         .histograms(
//!             "GLBX-20250227-P8LQFHG7JM",
//!             &TimeRange::new(7.0, 16.0),
//!             &[TickField::Price],
//!             20,
//!         )
//!         .await?;
//!     println!("{} price bins", histograms[&TickField::Price].len());
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod cache;
pub mod config;
pub mod index;
pub mod loader;
pub mod ticks;

// Re-export top-level types for convenience
pub use ticks::{
    FileId, FileInfo, Side, TickBatch, TickError, TickRecord, TickResult, TickSequence, TimeRange,
};

pub use index::{TimeBucketIndex, DEFAULT_BUCKET_WIDTH};

pub use analytics::{
    Histogram, HistogramBin, HistogramConfig, HistogramEngine, SideBin, SideHistogram,
    SpreadPoint, SpreadSummary, SummaryStatistics, TickField, MAX_BIN_COUNT,
};

pub use cache::{DataCache, FileCacheEntry, TickStore};

pub use loader::{CsvLoader, LoadError, MockLoader, TickLoader};

pub use config::{Config, ConfigError, IndexConfig, LoaderConfig, LoaderSource, LoggingConfig};
