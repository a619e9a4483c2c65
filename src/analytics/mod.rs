//! Tick analytics
//!
//! - **histogram**: equal-width distributions with adaptive sampling
//! - **summary**: per-file counts, extremes, means and time span
//! - **spread**: per-window bid/ask spread and its quantiles

pub mod histogram;
pub mod spread;
pub mod summary;

pub use histogram::{
    Histogram, HistogramBin, HistogramConfig, HistogramEngine, SideBin, SideHistogram, TickField,
    MAX_BIN_COUNT,
};
pub use spread::{bid_ask_series, SpreadPoint, SpreadSummary};
pub use summary::SummaryStatistics;
