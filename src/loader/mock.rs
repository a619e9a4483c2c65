//! Mock Loader
//!
//! Deterministic synthetic sessions for demos and tests. Each file is a
//! sine-wave price around a base with a little deterministic jitter,
//! sizes between 10 and 110 and mixed sides, spaced 0.5s apart. Every
//! file trades a single symbol.

use super::*;
use crate::ticks::Side;
use chrono::Duration;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shape of one mock session
#[derive(Debug, Clone)]
struct MockFile {
    id: String,
    symbol: String,
    base_price: f64,
    volatility: f64,
}

/// Generates synthetic ticks for a fixed set of files
pub struct MockLoader {
    files: Vec<MockFile>,
    tick_count: usize,
    spacing_secs: f64,
    latency: std::time::Duration,
    loads: AtomicUsize,
}

impl Default for MockLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLoader {
    /// Two ES sessions of 100 ticks each
    pub fn new() -> Self {
        Self {
            files: vec![
                MockFile {
                    id: "GLBX-20250227-P8LQFHG7JM".to_string(),
                    symbol: "ES-2025H".to_string(),
                    base_price: 100.0,
                    volatility: 0.5,
                },
                MockFile {
                    id: "GLBX-20250226-X7KPFGT5LM".to_string(),
                    symbol: "ES-2025M".to_string(),
                    base_price: 98.0,
                    volatility: 0.7,
                },
            ],
            tick_count: 100,
            spacing_secs: 0.5,
            latency: std::time::Duration::ZERO,
            loads: AtomicUsize::new(0),
        }
    }

    /// Set the number of ticks per file
    pub fn with_tick_count(mut self, count: usize) -> Self {
        self.tick_count = count;
        self
    }

    /// Set the time between ticks
    pub fn with_spacing(mut self, spacing_secs: f64) -> Self {
        self.spacing_secs = spacing_secs;
        self
    }

    /// Delay every load, to mimic a remote source
    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Add a file with its own symbol, base price and volatility
    pub fn with_file(mut self, id: &str, symbol: &str, base_price: f64, volatility: f64) -> Self {
        self.files.push(MockFile {
            id: id.to_string(),
            symbol: symbol.to_string(),
            base_price,
            volatility,
        });
        self
    }

    /// Number of completed `load` calls
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn generate(&self, file: &MockFile, seed: usize) -> Vec<TickRecord> {
        (0..self.tick_count)
            .map(|i| {
                let jitter = ((i * 7919 + seed * 104_729) % 1000) as f64 / 1000.0;
                let price = file.base_price
                    + (i as f64 * 0.1).sin() * file.volatility
                    + jitter * file.volatility;
                let size = 10 + ((i * 37 + seed * 13) % 100) as u32;
                let side = if (i * 31 + seed) % 7 < 4 { Side::Ask } else { Side::Bid };

                TickRecord::new(i as f64 * self.spacing_secs, price, size, side)
            })
            .collect()
    }
}

#[async_trait]
impl TickLoader for MockLoader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_files(&self) -> Result<Vec<FileInfo>, LoadError> {
        Ok(self
            .files
            .iter()
            .map(|file| {
                let info = FileInfo::new(&file.id, format!("data/parsed/{}", file.id));
                // Mock sessions open at 08:30 UTC
                match session_date_from_id(&file.id) {
                    Some(date) => info.session_start(date + Duration::minutes(8 * 60 + 30)),
                    None => info,
                }
            })
            .collect())
    }

    async fn load(&self, file_id: &str) -> Result<TickBatch, LoadError> {
        let (seed, file) = self
            .files
            .iter()
            .enumerate()
            .find(|(_, f)| f.id == file_id)
            .ok_or_else(|| LoadError::NotFound(file_id.to_string()))?;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let ticks = self.generate(file, seed);
        self.loads.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Generated {} mock ticks for {}", ticks.len(), file_id);

        Ok(TickBatch::new(ticks).with_symbols([file.symbol.as_str()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_files() {
        let loader = MockLoader::new();
        let files = loader.list_files().await.unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, "GLBX-20250227-P8LQFHG7JM");
        assert_eq!(
            files[0].session_start.unwrap().to_rfc3339(),
            "2025-02-27T08:30:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_load_is_deterministic_and_sorted() {
        let loader = MockLoader::new().with_tick_count(500);

        let batch = loader.load("GLBX-20250226-X7KPFGT5LM").await.unwrap();
        let second = loader.load("GLBX-20250226-X7KPFGT5LM").await.unwrap();
        assert_eq!(batch.symbols, vec!["ES-2025M".to_string()]);

        let first = batch.ticks;
        let second = second.ticks;

        assert_eq!(first.len(), 500);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].seconds_from_start <= w[1].seconds_from_start));
        assert_eq!(first[1].seconds_from_start, 0.5);
        assert!(first.iter().all(|t| (10..110).contains(&t.size.unwrap())));
        assert!(first.iter().any(|t| t.side == Some(Side::Ask)));
        assert!(first.iter().any(|t| t.side == Some(Side::Bid)));
        assert_eq!(loader.load_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_file() {
        let loader = MockLoader::new();
        let result = loader.load("missing").await;

        assert!(matches!(result, Err(LoadError::NotFound(_))));
        assert_eq!(loader.load_count(), 0);
    }

    #[tokio::test]
    async fn test_file_info() {
        let loader = MockLoader::new().with_file("CUSTOM", "CL-2025K", 50.0, 1.0);

        let info = loader.file_info("CUSTOM").await.unwrap();
        assert_eq!(info.path, "data/parsed/CUSTOM");
        assert!(info.session_start.is_none());
        assert!(loader.file_info("nope").await.is_err());

        let batch = loader.load("CUSTOM").await.unwrap();
        assert_eq!(batch.symbols, vec!["CL-2025K".to_string()]);
        assert_eq!(batch.len(), 100);
    }
}
