//! Tickscope error types
//!
//! Errors raised at the crate boundary. The index, search and histogram
//! code never fails: empty or malformed input yields empty output.

use crate::config::ConfigError;
use crate::loader::LoadError;
use thiserror::Error;

/// Errors that can occur while loading or looking up tick data
#[derive(Error, Debug)]
pub enum TickError {
    /// The loader failed to produce a tick sequence
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Requested file is not in the cache
    #[error("File not loaded: {0}")]
    NotLoaded(String),

    /// Unknown field name for histograms
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for tick operations
pub type TickResult<T> = Result<T, TickError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TickError::NotLoaded("GLBX-1".to_string());
        assert_eq!(err.to_string(), "File not loaded: GLBX-1");

        let err = TickError::UnknownField("volume".to_string());
        assert_eq!(err.to_string(), "Unknown field: volume");
    }

    #[test]
    fn test_load_error_conversion() {
        let load_err = LoadError::NotFound("GLBX-1".to_string());
        let err: TickError = load_err.into();
        assert!(matches!(err, TickError::Load(LoadError::NotFound(_))));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: TickError = crate::config::Config::parse("[index]\nbucket_width = -1\n")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("Configuration error: Failed to parse config file"));
    }
}
