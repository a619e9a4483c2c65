//! Tick Loaders
//!
//! Sources that turn a file identifier into ticks:
//! - Mock generator (deterministic synthetic sessions)
//! - CSV directory (`seconds_from_start,price,size,side_desc`)
//!
//! Loaders only produce records; indexing and caching happen in
//! [`crate::cache`].

mod csv_loader;
mod mock;

pub use csv_loader::{CsvLoader, CsvParseResult};
pub use mock::MockLoader;

use crate::ticks::{FileInfo, TickBatch, TickRecord};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Common trait for all tick sources
#[async_trait]
pub trait TickLoader: Send + Sync {
    /// Unique name for this loader
    fn name(&self) -> &str;

    /// Files this loader can provide
    async fn list_files(&self) -> Result<Vec<FileInfo>, LoadError>;

    /// Load every tick of a file, in recorded order, with its symbols
    async fn load(&self, file_id: &str) -> Result<TickBatch, LoadError>;

    /// Metadata for one file
    async fn file_info(&self, file_id: &str) -> Result<FileInfo, LoadError> {
        self.list_files()
            .await?
            .into_iter()
            .find(|f| f.id == file_id)
            .ok_or_else(|| LoadError::NotFound(file_id.to_string()))
    }
}

/// Errors that can occur while loading ticks
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Loader task failed: {0}")]
    Task(String),
}

/// Session date encoded in identifiers like `GLBX-20250227-P8LQFHG7JM`
///
/// Returns midnight UTC of the first eight-digit `YYYYMMDD` token.
pub fn session_date_from_id(file_id: &str) -> Option<DateTime<Utc>> {
    file_id
        .split(|c: char| c == '-' || c == '_' || c == '.')
        .filter(|token| token.len() == 8 && token.bytes().all(|b| b.is_ascii_digit()))
        .find_map(|token| NaiveDate::parse_from_str(token, "%Y%m%d").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_date_from_id() {
        assert_eq!(
            session_date_from_id("GLBX-20250227-P8LQFHG7JM"),
            Some(Utc.with_ymd_and_hms(2025, 2, 27, 0, 0, 0).unwrap())
        );
        assert_eq!(
            session_date_from_id("ticks_20240101.csv").map(|d| d.timestamp()),
            Some(1704067200)
        );
        assert_eq!(session_date_from_id("GLBX-99999999-X"), None);
        assert_eq!(session_date_from_id("no-date-here"), None);
    }

    #[test]
    fn test_error_display() {
        let err = LoadError::NotFound("GLBX-1".to_string());
        assert_eq!(err.to_string(), "File not found: GLBX-1");
    }
}
