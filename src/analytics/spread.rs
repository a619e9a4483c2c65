//! Bid/ask spread analysis
//!
//! Reduces ticks to one point per time window (lowest ask, highest bid)
//! and summarizes the resulting spreads as box-plot quantiles.

use crate::ticks::{Side, TickRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Best ask and bid inside one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadPoint {
    /// Window start in seconds
    pub seconds_from_start: f64,
    pub min_ask: f64,
    pub max_bid: f64,
    pub spread: f64,
}

/// Per-window best ask/bid; windows without both sides are skipped
///
/// A non-positive or non-finite window yields an empty series.
pub fn bid_ask_series(records: &[TickRecord], window_secs: f64) -> Vec<SpreadPoint> {
    if !(window_secs > 0.0) || !window_secs.is_finite() {
        return Vec::new();
    }

    // window index → (min ask, max bid)
    let mut windows: BTreeMap<i64, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for record in records.iter().filter(|r| r.has_valid_time()) {
        let (Some(side), Some(price)) = (record.side, record.price.filter(|p| p.is_finite())) else {
            continue;
        };

        let window = (record.seconds_from_start / window_secs).floor() as i64;
        let (ask, bid) = windows.entry(window).or_default();
        match side {
            Side::Ask => *ask = Some(ask.map_or(price, |a| a.min(price))),
            Side::Bid => *bid = Some(bid.map_or(price, |b| b.max(price))),
        }
    }

    windows
        .into_iter()
        .filter_map(|(window, (ask, bid))| {
            let (min_ask, max_bid) = (ask?, bid?);
            Some(SpreadPoint {
                seconds_from_start: window as f64 * window_secs,
                min_ask,
                max_bid,
                spread: min_ask - max_bid,
            })
        })
        .collect()
}

/// Box-plot quantiles of a set of spreads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

impl SpreadSummary {
    /// Quantiles by nearest rank `floor(n * p)`; NaN values are dropped
    pub fn from_spreads(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let at = |p: f64| sorted[((n as f64 * p).floor() as usize).min(n - 1)];

        Some(Self {
            min: sorted[0],
            q1: at(0.25),
            median: at(0.5),
            q3: at(0.75),
            max: sorted[n - 1],
            count: n,
        })
    }

    pub fn from_series(series: &[SpreadPoint]) -> Option<Self> {
        Self::from_spreads(series.iter().map(|p| p.spread))
    }

    pub fn interquartile_range(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_per_window() {
        let records = vec![
            TickRecord::new(0.1, 100.50, 1, Side::Ask),
            TickRecord::new(0.2, 100.25, 1, Side::Ask),
            TickRecord::new(0.3, 100.00, 1, Side::Bid),
            TickRecord::new(0.9, 100.10, 1, Side::Bid),
            // ask-only window
            TickRecord::new(1.5, 101.00, 1, Side::Ask),
            TickRecord::new(2.0, 99.00, 1, Side::Bid),
            TickRecord::new(2.5, 99.50, 1, Side::Ask),
            TickRecord::at(2.6),
        ];

        let series = bid_ask_series(&records, 1.0);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].seconds_from_start, 0.0);
        assert_eq!(series[0].min_ask, 100.25);
        assert_eq!(series[0].max_bid, 100.10);
        assert!((series[0].spread - 0.15).abs() < 1e-9);
        assert_eq!(series[1].seconds_from_start, 2.0);
        assert_eq!(series[1].spread, 0.5);
    }

    #[test]
    fn test_invalid_window() {
        let records = vec![TickRecord::new(0.0, 1.0, 1, Side::Ask)];
        assert!(bid_ask_series(&records, 0.0).is_empty());
        assert!(bid_ask_series(&records, f64::NAN).is_empty());
    }

    #[test]
    fn test_quantiles() {
        let spreads = [0.4, 0.1, 0.3, 0.2, 0.5, 0.6, 0.7, 0.8];
        let summary = SpreadSummary::from_spreads(spreads).unwrap();

        assert_eq!(summary.count, 8);
        assert_eq!(summary.min, 0.1);
        assert_eq!(summary.q1, 0.3);
        assert_eq!(summary.median, 0.5);
        assert_eq!(summary.q3, 0.7);
        assert_eq!(summary.max, 0.8);
        assert!((summary.interquartile_range() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_empty_quantiles() {
        assert!(SpreadSummary::from_spreads(Vec::new()).is_none());
        assert!(SpreadSummary::from_spreads([f64::NAN]).is_none());
    }
}
