//! Per-file summary statistics
//!
//! One pass over a tick sequence: record and side counts, price and size
//! extremes and means, price standard deviation and the covered time span.
//! Symbols come from the loader, since records do not carry them.

use crate::ticks::{Side, TickSequence};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one file's ticks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_records: usize,
    pub unique_symbols: usize,
    pub unique_symbol_list: Vec<String>,
    pub ask_count: usize,
    pub bid_count: usize,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub avg_price: Option<f64>,
    /// Population standard deviation
    pub price_std_dev: Option<f64>,
    pub min_size: Option<u32>,
    pub max_size: Option<u32>,
    pub avg_size: Option<f64>,
    pub start_seconds: Option<f64>,
    pub end_seconds: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Running mean and variance (Welford)
#[derive(Debug, Default)]
struct Moments {
    count: usize,
    mean: f64,
    m2: f64,
}

impl Moments {
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    fn std_dev(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.m2 / self.count as f64).sqrt())
    }
}

impl SummaryStatistics {
    /// Summarize a sequence; `session_start` anchors wall-clock times
    pub fn compute(
        sequence: &TickSequence,
        symbols: &[String],
        session_start: Option<DateTime<Utc>>,
    ) -> Self {
        let mut unique_symbol_list = symbols.to_vec();
        unique_symbol_list.sort_unstable();
        unique_symbol_list.dedup();

        let mut stats = Self {
            total_records: sequence.len(),
            unique_symbols: unique_symbol_list.len(),
            unique_symbol_list,
            ..Default::default()
        };

        let mut prices = Moments::default();
        let mut size_sum = 0u64;
        let mut size_count = 0usize;

        for record in sequence.records() {
            match record.side {
                Some(Side::Ask) => stats.ask_count += 1,
                Some(Side::Bid) => stats.bid_count += 1,
                None => {}
            }

            if let Some(price) = record.price.filter(|p| p.is_finite()) {
                stats.min_price = Some(stats.min_price.map_or(price, |m| m.min(price)));
                stats.max_price = Some(stats.max_price.map_or(price, |m| m.max(price)));
                prices.push(price);
            }

            if let Some(size) = record.size {
                stats.min_size = Some(stats.min_size.map_or(size, |m| m.min(size)));
                stats.max_size = Some(stats.max_size.map_or(size, |m| m.max(size)));
                size_sum += u64::from(size);
                size_count += 1;
            }
        }

        stats.avg_price = prices.mean();
        stats.price_std_dev = prices.std_dev();
        stats.avg_size = (size_count > 0).then(|| size_sum as f64 / size_count as f64);

        if let Some((start, end)) = sequence.time_span() {
            stats.start_seconds = Some(start);
            stats.end_seconds = Some(end);

            if let Some(origin) = session_start {
                stats.start_time = Some(origin + seconds_to_duration(start));
                stats.end_time = Some(origin + seconds_to_duration(end));
            }
        }

        stats
    }

    /// Covered time span in seconds
    pub fn duration_seconds(&self) -> Option<f64> {
        Some(self.end_seconds? - self.start_seconds?)
    }
}

fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::nanoseconds((seconds * 1e9).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::TickRecord;
    use chrono::TimeZone;

    #[test]
    fn test_summary_of_mixed_ticks() {
        let seq = TickSequence::new(vec![
            TickRecord::new(0.0, 100.0, 10, Side::Ask),
            TickRecord::new(0.5, 102.0, 30, Side::Bid),
            TickRecord::new(1.0, 104.0, 20, Side::Ask),
            TickRecord::at(1.5),
        ]);

        let stats = SummaryStatistics::compute(&seq, &[], None);

        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.unique_symbols, 0);
        assert_eq!(stats.ask_count, 2);
        assert_eq!(stats.bid_count, 1);
        assert_eq!(stats.min_price, Some(100.0));
        assert_eq!(stats.max_price, Some(104.0));
        assert_eq!(stats.avg_price, Some(102.0));
        let std_dev = stats.price_std_dev.unwrap();
        assert!((std_dev - (8.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(stats.min_size, Some(10));
        assert_eq!(stats.max_size, Some(30));
        assert_eq!(stats.avg_size, Some(20.0));
        assert_eq!(stats.start_seconds, Some(0.0));
        assert_eq!(stats.end_seconds, Some(1.5));
        assert_eq!(stats.duration_seconds(), Some(1.5));
        assert!(stats.start_time.is_none());
    }

    #[test]
    fn test_summary_of_empty_sequence() {
        let stats = SummaryStatistics::compute(&TickSequence::default(), &[], None);
        assert_eq!(stats, SummaryStatistics::default());
    }

    #[test]
    fn test_wall_clock_times() {
        let origin = Utc.with_ymd_and_hms(2025, 2, 27, 8, 30, 0).unwrap();
        let seq = TickSequence::new(vec![TickRecord::at(0.0), TickRecord::at(90.5)]);

        let stats = SummaryStatistics::compute(&seq, &[], Some(origin));

        assert_eq!(stats.start_time, Some(origin));
        assert_eq!(
            stats.end_time,
            Some(origin + Duration::seconds(90) + Duration::milliseconds(500))
        );
    }

    #[test]
    fn test_symbols() {
        let seq = TickSequence::new(vec![TickRecord::at(0.0)]);
        let symbols = vec!["ESM5".to_string(), "ESH5".to_string(), "ESM5".to_string()];

        let stats = SummaryStatistics::compute(&seq, &symbols, None);

        assert_eq!(stats.unique_symbols, 2);
        assert_eq!(stats.unique_symbol_list, vec!["ESH5".to_string(), "ESM5".to_string()]);
    }
}
