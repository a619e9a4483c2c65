//! CSV Loader
//!
//! Loads `<data_dir>/<file_id>.csv` files. Columns are detected from the
//! header row: a time column (`seconds_from_start`, `seconds` or `time`)
//! is required; `price`, `size`, `side_desc`/`side` and `symbol` are
//! optional. Extra columns are ignored.

use super::*;
use crate::ticks::Side;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Result of parsing one CSV file
#[derive(Debug, Default)]
pub struct CsvParseResult {
    pub ticks: Vec<TickRecord>,
    /// Distinct symbols of the parsed rows, sorted
    pub symbols: Vec<String>,
    pub rows_processed: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

/// Column positions found in the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    time: usize,
    price: Option<usize>,
    size: Option<usize>,
    side: Option<usize>,
    symbol: Option<usize>,
}

impl Columns {
    fn detect(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };

        let time = find(&["seconds_from_start", "seconds", "time"]).ok_or_else(|| {
            LoadError::ParseError("missing seconds_from_start column".to_string())
        })?;

        Ok(Self {
            time,
            price: find(&["price"]),
            size: find(&["size"]),
            side: find(&["side_desc", "side"]),
            symbol: find(&["symbol"]),
        })
    }
}

/// Directory-backed CSV tick source
pub struct CsvLoader {
    data_dir: PathBuf,
}

impl CsvLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, file_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", file_id))
    }

    /// Parse ticks from any CSV reader
    ///
    /// Rows without a usable timestamp are counted as failed and skipped.
    /// Unparseable price, size or side values become `None`.
    pub fn parse_reader<R: Read>(reader: R) -> Result<CsvParseResult, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = Columns::detect(reader.headers()?)?;
        let mut result = CsvParseResult::default();
        let mut symbols: BTreeSet<String> = BTreeSet::new();

        for (line_num, row) in reader.records().enumerate() {
            let actual_line = line_num + 2;

            let row = match row {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(format!("Line {}: {}", actual_line, e));
                    result.rows_failed += 1;
                    continue;
                }
            };

            let seconds = match row.get(columns.time).map(str::trim).map(str::parse::<f64>) {
                Some(Ok(t)) if t.is_finite() => t,
                _ => {
                    result
                        .errors
                        .push(format!("Line {}: invalid seconds_from_start", actual_line));
                    result.rows_failed += 1;
                    continue;
                }
            };

            let field = |column: Option<usize>| {
                column
                    .and_then(|c| row.get(c))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            };

            if let Some(symbol) = field(columns.symbol) {
                if !symbols.contains(symbol) {
                    symbols.insert(symbol.to_string());
                }
            }

            result.ticks.push(TickRecord {
                seconds_from_start: seconds,
                price: field(columns.price).and_then(|s| s.parse().ok()),
                size: field(columns.size).and_then(|s| s.parse().ok()),
                side: field(columns.side).and_then(|s| s.parse::<Side>().ok()),
            });
            result.rows_processed += 1;
        }

        result.symbols = symbols.into_iter().collect();

        // Truncate errors if too many
        if result.errors.len() > 100 {
            let total = result.errors.len();
            result.errors.truncate(100);
            result.errors.push(format!("... and {} more errors", total - 100));
        }

        Ok(result)
    }

    /// Parse a CSV file from disk
    pub fn parse_file(path: &Path) -> Result<CsvParseResult, LoadError> {
        let file = std::fs::File::open(path)?;
        Self::parse_reader(std::io::BufReader::new(file))
    }
}

#[async_trait]
impl TickLoader for CsvLoader {
    fn name(&self) -> &str {
        "csv"
    }

    async fn list_files(&self) -> Result<Vec<FileInfo>, LoadError> {
        let mut files = Vec::new();

        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "csv").unwrap_or(false) {
                if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
                    let info = FileInfo::new(id, path.to_string_lossy());
                    files.push(match session_date_from_id(id) {
                        Some(date) => info.session_start(date),
                        None => info,
                    });
                }
            }
        }

        files.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(files)
    }

    async fn load(&self, file_id: &str) -> Result<TickBatch, LoadError> {
        let path = self.path_for(file_id);
        if !path.is_file() {
            return Err(LoadError::NotFound(file_id.to_string()));
        }

        let result = tokio::task::spawn_blocking(move || Self::parse_file(&path))
            .await
            .map_err(|e| LoadError::Task(e.to_string()))??;

        if result.rows_failed > 0 {
            tracing::warn!(
                "Skipped {} malformed rows in {}: {}",
                result.rows_failed,
                file_id,
                result.errors.first().map(String::as_str).unwrap_or("")
            );
        }
        tracing::info!("Loaded {} ticks from {}", result.ticks.len(), file_id);

        Ok(TickBatch::new(result.ticks).with_symbols(result.symbols))
    }
}
