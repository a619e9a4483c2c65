//! Tick Store - loads files through a `TickLoader` and caches them
//!
//! # Load path
//!
//! ```text
//! load(id) → cache hit? → return Arc (no I/O)
//!          → per-file guard → cache hit? (a racing load finished) → return
//!          → loader.load(id) → FileCacheEntry::build → cache.put → return
//! ```
//!
//! At most one load per file id runs at a time; the guard stays registered
//! while any request is queued on it. A failed load commits nothing, so
//! retrying is safe. A load or selection that finishes after `clear_cache`
//! is not committed.

use crate::analytics::{
    bid_ask_series, Histogram, HistogramEngine, SpreadPoint, SpreadSummary, SummaryStatistics,
    TickField,
};
use crate::cache::{DataCache, FileCacheEntry};
use crate::config::Config;
use crate::loader::TickLoader;
use crate::ticks::{FileId, FileInfo, TickError, TickRecord, TickResult, TimeRange};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Async front door to the data cache
pub struct TickStore {
    loader: Arc<dyn TickLoader>,
    bucket_width: u64,
    engine: HistogramEngine,
    cache: RwLock<DataCache>,
    /// Per-file guards for loads in flight
    pending: Mutex<HashMap<FileId, Arc<Mutex<()>>>>,
}

impl TickStore {
    pub fn new(loader: Arc<dyn TickLoader>, config: &Config) -> Self {
        Self {
            loader,
            bucket_width: config.index.bucket_width,
            engine: HistogramEngine::new(config.histogram.clone()),
            cache: RwLock::new(DataCache::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &HistogramEngine {
        &self.engine
    }

    pub fn loader_name(&self) -> &str {
        self.loader.name()
    }

    /// Files available from the loader
    pub async fn list_files(&self) -> TickResult<Vec<FileInfo>> {
        Ok(self.loader.list_files().await?)
    }

    /// Cached entry without loading
    pub async fn cached(&self, file_id: &str) -> Option<Arc<FileCacheEntry>> {
        self.cache.read().await.get(file_id)
    }

    /// Entry for a file, loading and indexing it on first use
    pub async fn load(&self, file_id: &str) -> TickResult<Arc<FileCacheEntry>> {
        if let Some(entry) = self.cached(file_id).await {
            tracing::debug!("Using cached data for file {}", file_id);
            return Ok(entry);
        }

        let guard = {
            let mut pending = self.pending.lock().await;
            pending
                .entry(file_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _loading = guard.lock().await;

        // A racing request may have finished the load while we waited
        let result = match self.cached(file_id).await {
            Some(entry) => Ok(entry),
            None => self.load_uncached(file_id).await,
        };

        self.release_guard(file_id, &guard).await;
        result
    }

    /// Unregister a load guard once nobody else is queued on it
    async fn release_guard(&self, file_id: &str, guard: &Arc<Mutex<()>>) {
        let mut pending = self.pending.lock().await;
        let registered = pending
            .get(file_id)
            .is_some_and(|current| Arc::ptr_eq(current, guard));

        // One reference in the map, one held by the caller
        if registered && Arc::strong_count(guard) == 2 {
            pending.remove(file_id);
        }
    }

    async fn load_uncached(&self, file_id: &str) -> TickResult<Arc<FileCacheEntry>> {
        let generation = self.cache.read().await.generation();

        let batch = match self.loader.load(file_id).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!("Failed to load {} from {}: {}", file_id, self.loader.name(), e);
                return Err(e.into());
            }
        };

        let session_start = match self.loader.file_info(file_id).await {
            Ok(info) => info.session_start,
            Err(e) => {
                tracing::debug!("No file info for {}: {}", file_id, e);
                None
            }
        };

        let entry = FileCacheEntry::build(
            file_id,
            batch,
            session_start,
            self.bucket_width,
            &self.engine,
        );

        tracing::info!(
            "Indexed {} ticks for {} into {} buckets",
            entry.index().indexed_len(),
            file_id,
            entry.index().bucket_count()
        );

        let mut cache = self.cache.write().await;
        if cache.generation() != generation {
            tracing::debug!("Cache cleared while loading {}; not caching it", file_id);
            return Ok(Arc::new(entry));
        }

        cache.put(file_id, entry);
        cache
            .get(file_id)
            .ok_or_else(|| TickError::NotLoaded(file_id.to_string()))
    }

    /// Load a file and add it to the selection
    ///
    /// If the cache is cleared while the file loads, the entry is returned
    /// but the file is not selected.
    pub async fn select(&self, file_id: &str) -> TickResult<Arc<FileCacheEntry>> {
        let generation = self.cache.read().await.generation();
        let entry = self.load(file_id).await?;

        let mut cache = self.cache.write().await;
        if cache.generation() == generation {
            cache.select(file_id);
        } else {
            tracing::debug!("Cache cleared while selecting {}; selection dropped", file_id);
        }
        Ok(entry)
    }

    /// Remove a file from the selection; its data stays cached
    pub async fn deselect(&self, file_id: &str) -> bool {
        self.cache.write().await.deselect(file_id)
    }

    /// Deselect a selected file, or load and select an unselected one
    ///
    /// Returns whether the file is selected afterwards.
    pub async fn toggle(&self, file_id: &str) -> TickResult<bool> {
        if self.deselect(file_id).await {
            return Ok(false);
        }
        self.select(file_id).await?;
        Ok(true)
    }

    pub async fn selected(&self) -> Vec<FileId> {
        self.cache.read().await.selected().to_vec()
    }

    /// Ticks of one file inside `range`
    pub async fn query(&self, file_id: &str, range: &TimeRange) -> TickResult<Vec<TickRecord>> {
        Ok(self.load(file_id).await?.query(range))
    }

    /// Ticks inside `range` for every selected, loaded file
    pub async fn query_selected(&self, range: &TimeRange) -> Vec<(FileId, Vec<TickRecord>)> {
        let cache = self.cache.read().await;
        cache
            .selected()
            .iter()
            .filter_map(|id| cache.get(id).map(|entry| (id.clone(), entry.query(range))))
            .collect()
    }

    /// Latest timestamp across the selected files
    pub async fn max_selected_time(&self) -> Option<f64> {
        let cache = self.cache.read().await;
        cache
            .selected()
            .iter()
            .filter_map(|id| cache.get(id)?.max_time())
            .reduce(f64::max)
    }

    /// Histograms of the ticks of one file inside `range`
    pub async fn histograms(
        &self,
        file_id: &str,
        range: &TimeRange,
        fields: &[TickField],
        bin_count: usize,
    ) -> TickResult<HashMap<TickField, Histogram>> {
        let entry = self.load(file_id).await?;
        Ok(entry.histograms(range, fields, bin_count, &self.engine))
    }

    pub async fn summary(&self, file_id: &str) -> TickResult<SummaryStatistics> {
        Ok(self.load(file_id).await?.summary().clone())
    }

    /// Per-window bid/ask spread inside `range` and its quantiles
    pub async fn spread(
        &self,
        file_id: &str,
        range: &TimeRange,
        window_secs: f64,
    ) -> TickResult<(Vec<SpreadPoint>, Option<SpreadSummary>)> {
        let ticks = self.query(file_id, range).await?;
        let series = bid_ask_series(&ticks, window_secs);
        let summary = SpreadSummary::from_series(&series);
        Ok((series, summary))
    }

    /// Drop every cached file and the selection
    pub async fn clear_cache(&self) -> usize {
        let dropped = self.cache.write().await.invalidate_all();
        tracing::info!("Cache cleared ({} files dropped)", dropped);
        dropped
    }

    pub async fn cached_files(&self) -> Vec<FileId> {
        self.cache
            .read()
            .await
            .file_ids()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
