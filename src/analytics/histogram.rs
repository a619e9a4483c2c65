//! Histogram Engine - equal-width value distributions
//!
//! Builds frequency histograms over a numeric field of a record slice in
//! two passes: one for the extent (min, max, valid count) and one for
//! counting.
//!
//! # Sampling
//!
//! Inputs above `sample_threshold` records keep an exact extent but count
//! only every `stride`-th record, each hit weighted by `stride`:
//!
//! ```text
//! stride = ceil(len * bin_count / (max_sample_size * max_bins_assumed))
//! ```
//!
//! Bin edges stay exact; counts become proportional estimates.
//!
//! `side_histogram` uses the same edges and also splits each bin into
//! ask and bid counts.

use crate::ticks::{Side, TickError, TickRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Added to the bin width so the maximum never rounds past the last bin
const BIN_EPSILON: f64 = 0.000001;

/// Upper limit on the number of bins; larger requests are clamped
pub const MAX_BIN_COUNT: usize = 10_000;

/// Histogram engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramConfig {
    /// Default number of bins
    #[serde(default = "default_bin_count")]
    pub bin_count: usize,

    /// Inputs longer than this are sampled for counting
    #[serde(default = "default_sample_threshold")]
    pub sample_threshold: usize,

    /// Target number of sampled records
    #[serde(default = "default_max_sample_size")]
    pub max_sample_size: usize,

    /// Bin count the sample size was sized for
    #[serde(default = "default_max_bins_assumed")]
    pub max_bins_assumed: usize,
}

fn default_bin_count() -> usize {
    20
}

fn default_sample_threshold() -> usize {
    100_000
}

fn default_max_sample_size() -> usize {
    100_000
}

fn default_max_bins_assumed() -> usize {
    10
}

impl HistogramConfig {
    /// Bin counts offered to users
    pub const BIN_PRESETS: [usize; 5] = [10, 20, 30, 50, 100];
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bin_count: default_bin_count(),
            sample_threshold: default_sample_threshold(),
            max_sample_size: default_max_sample_size(),
            max_bins_assumed: default_max_bins_assumed(),
        }
    }
}

/// Numeric tick fields that can be binned
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TickField {
    Price,
    Size,
    SecondsFromStart,
}

impl TickField {
    /// The field's value if present and finite
    pub fn value(&self, record: &TickRecord) -> Option<f64> {
        let value = match self {
            TickField::Price => record.price?,
            TickField::Size => f64::from(record.size?),
            TickField::SecondsFromStart => record.seconds_from_start,
        };
        value.is_finite().then_some(value)
    }
}

impl std::fmt::Display for TickField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickField::Price => write!(f, "price"),
            TickField::Size => write!(f, "size"),
            TickField::SecondsFromStart => write!(f, "seconds_from_start"),
        }
    }
}

impl FromStr for TickField {
    type Err = TickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(TickField::Price),
            "size" => Ok(TickField::Size),
            "seconds_from_start" | "time" => Ok(TickField::SecondsFromStart),
            other => Err(TickError::UnknownField(other.to_string())),
        }
    }
}

/// One equal-width bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub bin_start: f64,
    pub bin_end: f64,
    pub count: u64,
    /// Bin start formatted for display
    pub label: String,
}

impl HistogramBin {
    fn new(bin_start: f64, bin_end: f64, count: u64) -> Self {
        Self {
            bin_start,
            bin_end,
            count,
            label: format!("{:.2}", bin_start),
        }
    }
}

/// Ordered bins over `[min, max]` of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    bins: Vec<HistogramBin>,
    /// Records with a valid value, counted over the full input
    valid_count: usize,
    /// 1 when every record was counted
    stride: usize,
}

impl Histogram {
    fn empty() -> Self {
        Self {
            bins: Vec::new(),
            valid_count: 0,
            stride: 1,
        }
    }

    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    pub fn into_bins(self) -> Vec<HistogramBin> {
        self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn is_sampled(&self) -> bool {
        self.stride > 1
    }

    /// Sum of bin counts
    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Largest bin count, for axis scaling
    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::empty()
    }
}

/// One bin of a side-split histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideBin {
    pub bin_start: f64,
    pub bin_end: f64,
    /// Every valid value in the bin, with or without a side
    pub count: u64,
    pub ask_count: u64,
    pub bid_count: u64,
    pub label: String,
}

/// Histogram whose bins also count asks and bids separately
///
/// Bin edges match [`HistogramEngine::histogram`] for the same input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideHistogram {
    bins: Vec<SideBin>,
    valid_count: usize,
    stride: usize,
}

impl SideHistogram {
    pub fn bins(&self) -> &[SideBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn ask_total(&self) -> u64 {
        self.bins.iter().map(|b| b.ask_count).sum()
    }

    pub fn bid_total(&self) -> u64 {
        self.bins.iter().map(|b| b.bid_count).sum()
    }
}

impl Default for SideHistogram {
    fn default() -> Self {
        Self {
            bins: Vec::new(),
            valid_count: 0,
            stride: 1,
        }
    }
}

/// Min/max/count of the valid values of one field
#[derive(Debug, Clone, Copy)]
struct Extent {
    min: f64,
    max: f64,
    count: usize,
}

impl Extent {
    fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
        }
    }

    fn observe(&mut self, value: Option<f64>) {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
            self.count += 1;
        }
    }
}

/// Bin edges derived from an extent
#[derive(Debug, Clone, Copy)]
struct BinLayout {
    min: f64,
    max: f64,
    width: f64,
    bin_count: usize,
}

impl BinLayout {
    /// `None` when the extent holds no values; a single distinct value
    /// gets one zero-width bin
    fn new(extent: Extent, bin_count: usize) -> Option<Self> {
        if extent.count == 0 {
            return None;
        }

        if extent.min == extent.max {
            return Some(Self {
                min: extent.min,
                max: extent.max,
                width: 0.0,
                bin_count: 1,
            });
        }

        let bin_count = bin_count.clamp(1, MAX_BIN_COUNT);
        Some(Self {
            min: extent.min,
            max: extent.max,
            width: (extent.max - extent.min) / bin_count as f64 + BIN_EPSILON,
            bin_count,
        })
    }

    fn is_single_value(&self) -> bool {
        self.width == 0.0
    }

    fn edges(&self, i: usize) -> (f64, f64) {
        if self.is_single_value() {
            return (self.min, self.max);
        }
        (
            self.min + i as f64 * self.width,
            self.min + (i + 1) as f64 * self.width,
        )
    }

    fn index(&self, value: f64) -> usize {
        if self.is_single_value() || value == self.max {
            return self.bin_count - 1;
        }
        let bin = ((value - self.min) / self.width).floor().max(0.0) as usize;
        bin.min(self.bin_count - 1)
    }
}

/// Computes histograms with adaptive sampling
#[derive(Debug, Clone, Default)]
pub struct HistogramEngine {
    config: HistogramConfig,
}

impl HistogramEngine {
    pub fn new(config: HistogramConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HistogramConfig {
        &self.config
    }

    /// Counting stride for an input of `total` records
    pub fn stride_for(&self, total: usize, bin_count: usize) -> usize {
        if total <= self.config.sample_threshold {
            return 1;
        }

        let budget = self
            .config
            .max_sample_size
            .max(1)
            .saturating_mul(self.config.max_bins_assumed.max(1));
        total
            .saturating_mul(bin_count.clamp(1, MAX_BIN_COUNT))
            .div_ceil(budget)
            .max(1)
    }

    /// Stride for a layout; a single-value layout is always counted exactly
    fn stride_for_layout(&self, total: usize, layout: &BinLayout) -> usize {
        if layout.is_single_value() {
            return 1;
        }

        let stride = self.stride_for(total, layout.bin_count);
        if stride > 1 {
            tracing::debug!(
                "Sampling {} records with stride {} for {} bins",
                total,
                stride,
                layout.bin_count
            );
        }
        stride
    }

    /// Histogram of one tick field
    pub fn histogram(
        &self,
        records: &[TickRecord],
        field: TickField,
        bin_count: usize,
    ) -> Histogram {
        self.histogram_by(records, |r| field.value(r), bin_count)
    }

    /// Histogram of an arbitrary projection
    ///
    /// Records for which `key` yields `None`, NaN or an infinite value are
    /// ignored.
    pub fn histogram_by<T, F>(&self, records: &[T], key: F, bin_count: usize) -> Histogram
    where
        F: Fn(&T) -> Option<f64>,
    {
        let mut extent = Extent::new();
        for record in records {
            extent.observe(key(record));
        }

        self.count_bins(records, &key, extent, bin_count)
    }

    /// Histograms of several tick fields from one extent scan
    pub fn histograms_for(
        &self,
        records: &[TickRecord],
        fields: &[TickField],
        bin_count: usize,
    ) -> HashMap<TickField, Histogram> {
        let mut extents = vec![Extent::new(); fields.len()];
        for record in records {
            for (field, extent) in fields.iter().zip(extents.iter_mut()) {
                extent.observe(field.value(record));
            }
        }

        fields
            .iter()
            .zip(extents)
            .map(|(&field, extent)| {
                let key = |r: &TickRecord| field.value(r);
                (field, self.count_bins(records, &key, extent, bin_count))
            })
            .collect()
    }

    /// Histogram of one tick field with per-bin ask and bid counts
    ///
    /// Records without a side count toward `count` only.
    pub fn side_histogram(
        &self,
        records: &[TickRecord],
        field: TickField,
        bin_count: usize,
    ) -> SideHistogram {
        let mut extent = Extent::new();
        for record in records {
            extent.observe(field.value(record));
        }

        let Some(layout) = BinLayout::new(extent, bin_count) else {
            return SideHistogram::default();
        };
        let stride = self.stride_for_layout(records.len(), &layout);

        let mut bins: Vec<SideBin> = (0..layout.bin_count)
            .map(|i| {
                let (bin_start, bin_end) = layout.edges(i);
                SideBin {
                    bin_start,
                    bin_end,
                    count: 0,
                    ask_count: 0,
                    bid_count: 0,
                    label: format!("{:.2}", bin_start),
                }
            })
            .collect();

        let weight = stride as u64;
        for record in records.iter().step_by(stride) {
            let Some(value) = field.value(record) else {
                continue;
            };

            let bin = &mut bins[layout.index(value)];
            bin.count += weight;
            match record.side {
                Some(Side::Ask) => bin.ask_count += weight,
                Some(Side::Bid) => bin.bid_count += weight,
                None => {}
            }
        }

        SideHistogram {
            bins,
            valid_count: extent.count,
            stride,
        }
    }

    fn count_bins<T, F>(
        &self,
        records: &[T],
        key: &F,
        extent: Extent,
        bin_count: usize,
    ) -> Histogram
    where
        F: Fn(&T) -> Option<f64>,
    {
        let Some(layout) = BinLayout::new(extent, bin_count) else {
            return Histogram::empty();
        };
        let stride = self.stride_for_layout(records.len(), &layout);

        let mut bins: Vec<HistogramBin> = (0..layout.bin_count)
            .map(|i| {
                let (bin_start, bin_end) = layout.edges(i);
                HistogramBin::new(bin_start, bin_end, 0)
            })
            .collect();

        let weight = stride as u64;
        for record in records.iter().step_by(stride) {
            if let Some(value) = key(record).filter(|v| v.is_finite()) {
                bins[layout.index(value)].count += weight;
            }
        }

        Histogram {
            bins,
            valid_count: extent.count,
            stride,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::Side;

    fn priced(prices: &[f64]) -> Vec<TickRecord> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| TickRecord::at(i as f64).price(p))
            .collect()
    }

    #[test]
    fn test_small_price_histogram() {
        let engine = HistogramEngine::default();
        let records = priced(&[1.0, 1.0, 2.0, 3.0]);

        let histogram = engine.histogram(&records, TickField::Price, 2);

        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram.total_count(), 4);
        assert_eq!(histogram.bins()[0].bin_start, 1.0);
        assert!(histogram.bins()[1].bin_end >= 3.0);
        assert!(histogram.bins()[0].count >= 2);
        assert_eq!(histogram.bins()[1].count, 1);
        assert_eq!(histogram.bins()[0].label, "1.00");
        assert!(!histogram.is_sampled());
    }

    #[test]
    fn test_single_value_produces_one_bin() {
        let engine = HistogramEngine::default();
        let records = priced(&[5.5, 5.5, 5.5]);

        let histogram = engine.histogram(&records, TickField::Price, 20);

        assert_eq!(histogram.len(), 1);
        let bin = &histogram.bins()[0];
        assert_eq!((bin.bin_start, bin.bin_end, bin.count), (5.5, 5.5, 3));
        assert_eq!(bin.label, "5.50");
    }

    #[test]
    fn test_no_valid_values_is_empty() {
        let engine = HistogramEngine::default();
        let records = vec![TickRecord::at(0.0), TickRecord::at(1.0).price(f64::NAN)];

        assert!(engine.histogram(&records, TickField::Price, 10).is_empty());
        assert!(engine.histogram(&[], TickField::Size, 10).is_empty());
    }

    #[test]
    fn test_invalid_values_excluded() {
        let engine = HistogramEngine::default();
        let mut records = priced(&[1.0, 2.0, 3.0, 4.0]);
        records.push(TickRecord::at(9.0));
        records.push(TickRecord::at(10.0).price(f64::NAN));
        records.push(TickRecord::at(11.0).price(f64::INFINITY));

        let histogram = engine.histogram(&records, TickField::Price, 3);
        assert_eq!(histogram.valid_count(), 4);
        assert_eq!(histogram.total_count(), 4);
        assert_eq!(histogram.bins()[0].bin_start, 1.0);
    }

    #[test]
    fn test_counts_sum_to_valid_count() {
        let engine = HistogramEngine::default();
        let records: Vec<TickRecord> = (0..5_000)
            .map(|i| {
                let price = 100.0 + ((i * 37) % 101) as f64 * 0.25;
                TickRecord::new(i as f64, price, (i % 97) as u32 + 1, Side::Ask)
            })
            .collect();

        for bins in HistogramConfig::BIN_PRESETS {
            for field in [TickField::Price, TickField::Size, TickField::SecondsFromStart] {
                let histogram = engine.histogram(&records, field, bins);
                assert_eq!(histogram.len(), bins);
                assert_eq!(histogram.total_count(), 5_000, "{} with {} bins", field, bins);
            }
        }
    }

    #[test]
    fn test_maximum_lands_in_last_bin() {
        let engine = HistogramEngine::default();
        let records = priced(&[0.1, 0.2, 0.3]);

        let histogram = engine.histogram(&records, TickField::Price, 7);
        assert_eq!(histogram.bins().last().unwrap().count, 1);
    }

    #[test]
    fn test_zero_bins_clamped_to_one() {
        let engine = HistogramEngine::default();
        let histogram = engine.histogram(&priced(&[1.0, 2.0]), TickField::Price, 0);
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram.total_count(), 2);
    }

    #[test]
    fn test_histogram_by_plain_values() {
        let engine = HistogramEngine::default();
        let values = [0.0, 0.5, 1.0, 9.0, 10.0];

        let histogram = engine.histogram_by(&values, |v| Some(*v), 2);
        let counts: Vec<u64> = histogram.bins().iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![3, 2]);
    }

    #[test]
    fn test_stride_for() {
        let engine = HistogramEngine::default();
        assert_eq!(engine.stride_for(100_000, 20), 1);
        assert_eq!(engine.stride_for(250_000, 20), 5);
        assert_eq!(engine.stride_for(100_001, 10), 2);
        assert_eq!(engine.stride_for(1_000_000, 100), 100);
    }

    #[test]
    fn test_sampled_histogram_is_proportional() {
        let engine = HistogramEngine::default();
        let records: Vec<TickRecord> = (0..250_000)
            .map(|i| TickRecord::at(i as f64).price(((i * 7919) % 1009) as f64))
            .collect();

        let histogram = engine.histogram(&records, TickField::Price, 20);

        assert!(histogram.is_sampled());
        assert_eq!(histogram.stride(), 5);
        assert_eq!(histogram.valid_count(), 250_000);

        // Extent comes from every record, not just the sampled ones
        assert_eq!(histogram.bins()[0].bin_start, 0.0);
        assert!(histogram.bins().last().unwrap().bin_end >= 1008.0);

        let total = histogram.total_count() as f64;
        assert!((total - 250_000.0).abs() / 250_000.0 < 0.01, "total {}", total);

        // Uniform input stays roughly uniform
        let expected = 250_000.0 / 20.0;
        for bin in histogram.bins() {
            let error = (bin.count as f64 - expected).abs() / expected;
            assert!(error < 0.05, "bin {} count {}", bin.label, bin.count);
        }
    }

    #[test]
    fn test_histograms_for_multiple_fields() {
        let engine = HistogramEngine::default();
        let records = vec![
            TickRecord::new(0.0, 100.0, 10, Side::Ask),
            TickRecord::new(1.0, 101.0, 20, Side::Bid),
            TickRecord::at(2.0).size(30),
        ];

        let fields = [TickField::Price, TickField::Size];
        let histograms = engine.histograms_for(&records, &fields, 4);

        assert_eq!(histograms.len(), 2);
        assert_eq!(histograms[&TickField::Price].total_count(), 2);
        assert_eq!(histograms[&TickField::Size].total_count(), 3);
        assert_eq!(
            histograms[&TickField::Price],
            engine.histogram(&records, TickField::Price, 4)
        );
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("Price".parse::<TickField>().unwrap(), TickField::Price);
        assert_eq!("size".parse::<TickField>().unwrap(), TickField::Size);
        assert!(matches!(
            "volume".parse::<TickField>(),
            Err(TickError::UnknownField(_))
        ));
    }

    #[test]
    fn test_default_histogram_is_unsampled() {
        let histogram = Histogram::default();
        assert!(histogram.is_empty());
        assert_eq!(histogram.stride(), 1);
        assert!(!histogram.is_sampled());
        assert_eq!(SideHistogram::default().stride(), 1);
    }

    #[test]
    fn test_huge_bin_count_is_clamped() {
        let engine = HistogramEngine::default();
        let histogram = engine.histogram(&priced(&[1.0, 2.0, 3.0]), TickField::Price, usize::MAX);

        assert_eq!(histogram.len(), MAX_BIN_COUNT);
        assert_eq!(histogram.total_count(), 3);
        assert!(engine.stride_for(usize::MAX / 2, usize::MAX) >= 1);
    }

    #[test]
    fn test_side_histogram_splits_counts() {
        let engine = HistogramEngine::default();
        let records: Vec<TickRecord> = (0..1_000)
            .map(|i| {
                let side = if i % 3 == 0 { Side::Bid } else { Side::Ask };
                TickRecord::new(i as f64, 50.0 + (i % 40) as f64 * 0.25, 1, side)
            })
            .collect();

        let split = engine.side_histogram(&records, TickField::Price, 20);
        let plain = engine.histogram(&records, TickField::Price, 20);

        assert_eq!(split.len(), plain.len());
        for (side_bin, bin) in split.bins().iter().zip(plain.bins()) {
            assert_eq!(side_bin.bin_start, bin.bin_start);
            assert_eq!(side_bin.count, bin.count);
            assert_eq!(side_bin.ask_count + side_bin.bid_count, side_bin.count);
        }
        assert_eq!(split.bid_total(), 334);
        assert_eq!(split.ask_total(), 666);
    }

    #[test]
    fn test_side_histogram_unsided_records() {
        let engine = HistogramEngine::default();
        let records = vec![
            TickRecord::new(0.0, 10.0, 1, Side::Ask),
            TickRecord::new(1.0, 10.0, 2, Side::Bid),
            TickRecord::at(2.0).price(10.0),
        ];

        let split = engine.side_histogram(&records, TickField::Price, 10);

        assert_eq!(split.len(), 1);
        let bin = &split.bins()[0];
        assert_eq!((bin.count, bin.ask_count, bin.bid_count), (3, 1, 1));
        assert!(engine.side_histogram(&[], TickField::Size, 10).is_empty());
    }
}
