//! Data Cache - per-file memo of loaded ticks and derived artifacts
//!
//! Maps file id → `Arc<FileCacheEntry>` for O(1) lookup. Entries are
//! built completely before insertion and never mutated afterwards, so a
//! reader holding an `Arc` never sees a half-built index. There is no
//! eviction policy: the cache grows until `invalidate_all`, which also
//! advances the cache generation so loads started earlier can tell their
//! result is stale.

use crate::analytics::{
    Histogram, HistogramEngine, SideHistogram, SummaryStatistics, TickField,
};
use crate::index::TimeBucketIndex;
use crate::ticks::{FileId, TickBatch, TickRecord, TickSequence, TimeRange};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything derived from one loaded file
#[derive(Debug)]
pub struct FileCacheEntry {
    file_id: FileId,
    sequence: TickSequence,
    index: TimeBucketIndex,
    symbols: Vec<String>,
    summary: SummaryStatistics,
    /// Full-session price distribution by side, at the default bin count
    price_distribution: SideHistogram,
    /// Full-session size distribution by side, at the default bin count
    size_distribution: SideHistogram,
}

impl FileCacheEntry {
    /// Build the index, summary and distributions for a freshly loaded file
    pub fn build(
        file_id: impl Into<FileId>,
        batch: impl Into<TickBatch>,
        session_start: Option<DateTime<Utc>>,
        bucket_width: u64,
        engine: &HistogramEngine,
    ) -> Self {
        let TickBatch { ticks, symbols } = batch.into();
        let sequence = TickSequence::new(ticks);
        let index = TimeBucketIndex::build(&sequence, bucket_width);
        let summary = SummaryStatistics::compute(&sequence, &symbols, session_start);

        let bin_count = engine.config().bin_count;
        let records = sequence.records();

        Self {
            file_id: file_id.into(),
            price_distribution: engine.side_histogram(records, TickField::Price, bin_count),
            size_distribution: engine.side_histogram(records, TickField::Size, bin_count),
            symbols: summary.unique_symbol_list.clone(),
            sequence,
            index,
            summary,
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn sequence(&self) -> &TickSequence {
        &self.sequence
    }

    pub fn index(&self) -> &TimeBucketIndex {
        &self.index
    }

    /// Distinct symbols traded in the file
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn summary(&self) -> &SummaryStatistics {
        &self.summary
    }

    pub fn price_distribution(&self) -> &SideHistogram {
        &self.price_distribution
    }

    pub fn size_distribution(&self) -> &SideHistogram {
        &self.size_distribution
    }

    /// Ticks inside `range`
    pub fn query(&self, range: &TimeRange) -> Vec<TickRecord> {
        self.index.query_range(&self.sequence, range)
    }

    /// Histograms of the ticks inside `range`
    pub fn histograms(
        &self,
        range: &TimeRange,
        fields: &[TickField],
        bin_count: usize,
        engine: &HistogramEngine,
    ) -> HashMap<TickField, Histogram> {
        let filtered = self.query(range);
        engine.histograms_for(&filtered, fields, bin_count)
    }

    /// Last valid timestamp, the upper end of a time slider
    pub fn max_time(&self) -> Option<f64> {
        self.sequence.time_span().map(|(_, end)| end)
    }
}

/// In-memory cache of loaded files plus the current selection
#[derive(Debug, Default)]
pub struct DataCache {
    entries: HashMap<FileId, Arc<FileCacheEntry>>,
    /// Selected files in selection order
    selected: Vec<FileId>,
    /// Advanced by every `invalidate_all`
    generation: u64,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for a file, if loaded
    pub fn get(&self, file_id: &str) -> Option<Arc<FileCacheEntry>> {
        self.entries.get(file_id).cloned()
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.entries.contains_key(file_id)
    }

    /// Insert or replace an entry; returns the replaced one
    pub fn put(
        &mut self,
        file_id: impl Into<FileId>,
        entry: FileCacheEntry,
    ) -> Option<Arc<FileCacheEntry>> {
        self.entries.insert(file_id.into(), Arc::new(entry))
    }

    /// Drop every entry and the selection; returns the number of entries dropped
    pub fn invalidate_all(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.selected.clear();
        self.generation = self.generation.wrapping_add(1);
        dropped
    }

    /// Current generation; changes whenever the cache is invalidated
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mark a file selected; false if it already was
    pub fn select(&mut self, file_id: &str) -> bool {
        if self.is_selected(file_id) {
            return false;
        }
        self.selected.push(file_id.to_string());
        true
    }

    /// Unmark a file; false if it was not selected
    pub fn deselect(&mut self, file_id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|id| id != file_id);
        self.selected.len() != before
    }

    /// Flip selection; returns whether the file is now selected
    pub fn toggle(&mut self, file_id: &str) -> bool {
        if self.deselect(file_id) {
            false
        } else {
            self.select(file_id)
        }
    }

    pub fn is_selected(&self, file_id: &str) -> bool {
        self.selected.iter().any(|id| id == file_id)
    }

    pub fn selected(&self) -> &[FileId] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of cached files, sorted
    pub fn file_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
