//! Core data types for tick data
//!
//! - `TickRecord`: a single market event
//! - `TickSequence`: the time-ordered records of one file
//! - `TimeRange`: an inclusive `[min, max]` window in seconds
//! - `FileInfo`: a file as listed by a loader

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of a data file
pub type FileId = String;

/// Which side of the book a tick hit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Ask,
    Bid,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Ask => write!(f, "Ask"),
            Side::Bid => write!(f, "Bid"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" | "a" => Ok(Side::Ask),
            "bid" | "b" => Ok(Side::Bid),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

/// A single market event
///
/// Only `seconds_from_start` is required. Price, size and side may be
/// absent in the source; a missing or NaN value is skipped by histograms
/// and statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TickRecord {
    /// Offset from the start of the recording session, in seconds
    pub seconds_from_start: f64,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub side: Option<Side>,
}

impl TickRecord {
    /// Create a record with only a timestamp
    pub fn at(seconds_from_start: f64) -> Self {
        Self {
            seconds_from_start,
            price: None,
            size: None,
            side: None,
        }
    }

    /// Create a fully populated record
    pub fn new(seconds_from_start: f64, price: f64, size: u32, side: Side) -> Self {
        Self {
            seconds_from_start,
            price: Some(price),
            size: Some(size),
            side: Some(side),
        }
    }

    /// Builder method: set price
    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Builder method: set size
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Builder method: set side
    pub fn side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// A timestamp the index can place in a bucket
    pub fn has_valid_time(&self) -> bool {
        self.seconds_from_start.is_finite() && self.seconds_from_start >= 0.0
    }
}

/// Ordered ticks for one file, ascending by `seconds_from_start`
///
/// Sortedness is a contract with the loader. Ties are allowed and keep
/// their relative order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSequence {
    records: Vec<TickRecord>,
}

impl TickSequence {
    pub fn new(records: Vec<TickRecord>) -> Self {
        let sequence = Self { records };
        if !sequence.is_time_sorted() {
            tracing::warn!(
                "Tick sequence of {} records is not sorted by time; range queries may miss records",
                sequence.len()
            );
        }
        sequence
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&TickRecord> {
        self.records.get(position)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last valid timestamps
    pub fn time_span(&self) -> Option<(f64, f64)> {
        let mut valid = self.records.iter().filter(|r| r.has_valid_time());
        let first = valid.next()?.seconds_from_start;
        let last = valid.last().map(|r| r.seconds_from_start).unwrap_or(first);
        Some((first, last))
    }

    /// Check the ascending-time invariant, ignoring malformed timestamps
    pub fn is_time_sorted(&self) -> bool {
        let mut previous = f64::NEG_INFINITY;
        for record in self.records.iter().filter(|r| r.has_valid_time()) {
            if record.seconds_from_start < previous {
                return false;
            }
            previous = record.seconds_from_start;
        }
        true
    }
}

impl From<Vec<TickRecord>> for TickSequence {
    fn from(records: Vec<TickRecord>) -> Self {
        Self::new(records)
    }
}

/// Everything a loader returns for one file
///
/// Instrument symbols are per file rather than per record, which keeps
/// `TickRecord` `Copy`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickBatch {
    pub ticks: Vec<TickRecord>,
    /// Distinct symbols, sorted
    pub symbols: Vec<String>,
}

impl TickBatch {
    pub fn new(ticks: Vec<TickRecord>) -> Self {
        Self {
            ticks,
            symbols: Vec::new(),
        }
    }

    /// Attach symbols; duplicates and blanks are dropped
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut symbols: Vec<String> = symbols
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.trim().is_empty())
            .collect();
        symbols.sort_unstable();
        symbols.dedup();
        self.symbols = symbols;
        self
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

impl From<Vec<TickRecord>> for TickBatch {
    fn from(ticks: Vec<TickRecord>) -> Self {
        Self::new(ticks)
    }
}

/// Inclusive time window in seconds from session start
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeRange {
    pub min: f64,
    pub max: f64,
}

impl TimeRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `[0, +inf)`, every valid tick
    pub fn full() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
        }
    }

    /// Swap the bounds if they are reversed
    pub fn normalized(&self) -> Self {
        if self.min > self.max {
            Self {
                min: self.max,
                max: self.min,
            }
        } else {
            *self
        }
    }

    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.min && seconds <= self.max
    }

    pub fn is_empty(&self) -> bool {
        !(self.min <= self.max)
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::full()
    }
}

/// A data file as listed by a loader
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileInfo {
    pub id: FileId,
    pub name: String,
    pub path: String,
    /// Wall-clock time of `seconds_from_start == 0`, when known
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,
}

impl FileInfo {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            path: path.into(),
            session_start: None,
        }
    }

    /// Builder method: set session start
    pub fn session_start(mut self, start: DateTime<Utc>) -> Self {
        self.session_start = Some(start);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parsing() {
        assert_eq!("Ask".parse::<Side>().unwrap(), Side::Ask);
        assert_eq!(" bid ".parse::<Side>().unwrap(), Side::Bid);
        assert!("mid".parse::<Side>().is_err());
    }

    #[test]
    fn test_record_builder() {
        let record = TickRecord::at(1.5).price(100.25).size(3).side(Side::Bid);
        assert_eq!(record, TickRecord::new(1.5, 100.25, 3, Side::Bid));
        assert!(record.has_valid_time());
        assert!(!TickRecord::at(f64::NAN).has_valid_time());
        assert!(!TickRecord::at(-1.0).has_valid_time());
    }

    #[test]
    fn test_record_deserialize_optional_fields() {
        let record: TickRecord = serde_json::from_str(r#"{"seconds_from_start": 2.0}"#).unwrap();
        assert_eq!(record, TickRecord::at(2.0));
    }

    #[test]
    fn test_time_span_skips_malformed() {
        let seq = TickSequence::new(vec![
            TickRecord::at(f64::NAN),
            TickRecord::at(1.0),
            TickRecord::at(4.0),
            TickRecord::at(f64::INFINITY),
        ]);
        assert_eq!(seq.time_span(), Some((1.0, 4.0)));
        assert!(seq.is_time_sorted());

        assert_eq!(TickSequence::default().time_span(), None);
    }

    #[test]
    fn test_unsorted_detection() {
        let seq = TickSequence::new(vec![TickRecord::at(3.0), TickRecord::at(1.0)]);
        assert!(!seq.is_time_sorted());
    }

    #[test]
    fn test_time_range() {
        let range = TimeRange::new(10.0, 5.0);
        assert!(range.is_empty());
        assert_eq!(range.normalized(), TimeRange::new(5.0, 10.0));
        assert!(range.normalized().contains(10.0));
        assert!(TimeRange::full().contains(1e12));
        assert!(TimeRange::new(f64::NAN, 1.0).is_empty());
    }

    #[test]
    fn test_batch_symbols_are_distinct_and_sorted() {
        let batch = TickBatch::new(vec![TickRecord::at(0.0)])
            .with_symbols(["ESM5", "ESH5", "ESM5", " "]);

        assert_eq!(batch.symbols, vec!["ESH5".to_string(), "ESM5".to_string()]);
        assert_eq!(batch.len(), 1);
        assert!(TickBatch::from(Vec::new()).is_empty());
    }
}
