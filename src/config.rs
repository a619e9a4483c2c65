//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::analytics::HistogramConfig;
use crate::index::DEFAULT_BUCKET_WIDTH;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub histogram: HistogramConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Time bucket index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Bucket width in seconds
    #[serde(default = "default_bucket_width")]
    pub bucket_width: u64,
}

fn default_bucket_width() -> u64 {
    DEFAULT_BUCKET_WIDTH
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            bucket_width: default_bucket_width(),
        }
    }
}

/// Where ticks come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderSource {
    Mock,
    Csv,
}

impl std::str::FromStr for LoaderSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(LoaderSource::Mock),
            "csv" => Ok(LoaderSource::Csv),
            other => Err(format!("unknown loader source: {}", other)),
        }
    }
}

/// Tick loader configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_source")]
    pub source: LoaderSource,

    /// Directory of CSV files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Ticks generated per mock file
    #[serde(default = "default_mock_tick_count")]
    pub mock_tick_count: usize,
}

fn default_source() -> LoaderSource {
    LoaderSource::Mock
}

fn default_data_dir() -> String {
    "./data/parsed".to_string()
}

fn default_mock_tick_count() -> usize {
    100
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            data_dir: default_data_dir(),
            mock_tick_count: default_mock_tick_count(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("tickscope").join("config.toml")),
            Some(PathBuf::from("./tickscope.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Index overrides
        if let Some(width) = var("TICKSCOPE_BUCKET_WIDTH").and_then(|v| v.parse().ok()) {
            self.index.bucket_width = width;
        }

        // Histogram overrides
        if let Some(bins) = var("TICKSCOPE_BIN_COUNT").and_then(|v| v.parse().ok()) {
            self.histogram.bin_count = bins;
        }
        if let Some(size) = var("TICKSCOPE_MAX_SAMPLE_SIZE").and_then(|v| v.parse().ok()) {
            self.histogram.max_sample_size = size;
        }

        // Loader overrides
        if let Some(source) = var("TICKSCOPE_SOURCE").and_then(|v| v.parse().ok()) {
            self.loader.source = source;
        }
        if let Some(data_dir) = var("TICKSCOPE_DATA_DIR") {
            self.loader.data_dir = data_dir;
        }

        // Logging overrides
        if let Some(level) = var("TICKSCOPE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("TICKSCOPE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Tickscope Configuration
#
# Environment variables override these settings:
# - TICKSCOPE_BUCKET_WIDTH
# - TICKSCOPE_BIN_COUNT
# - TICKSCOPE_MAX_SAMPLE_SIZE
# - TICKSCOPE_SOURCE
# - TICKSCOPE_DATA_DIR
# - TICKSCOPE_LOG_LEVEL
# - TICKSCOPE_LOG_FORMAT

[index]
# Width of each time bucket (seconds)
bucket_width = 10

[histogram]
# Default number of bins (presets: 10, 20, 30, 50, 100)
bin_count = 20

# Inputs with more records than this are sampled when counting
sample_threshold = 100000

# Target number of sampled records
max_sample_size = 100000

# Bin count the sample size is sized for
max_bins_assumed = 10

[loader]
# Tick source: mock or csv
source = "mock"

# Directory holding <file_id>.csv files
data_dir = "./data/parsed"

# Ticks generated per mock file
mock_tick_count = 100

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.index.bucket_width, 10);
        assert_eq!(config.histogram.bin_count, 20);
        assert_eq!(config.histogram.max_sample_size, 100_000);
        assert_eq!(config.loader.source, LoaderSource::Mock);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config = Config::parse(&generate_default_config()).unwrap();
        let defaults = Config::default();

        assert_eq!(config.index.bucket_width, defaults.index.bucket_width);
        assert_eq!(config.histogram, defaults.histogram);
        assert_eq!(config.loader.data_dir, defaults.loader.data_dir);
        assert_eq!(config.logging.format, defaults.logging.format);
    }

    #[test]
    fn test_partial_config() {
        let toml = "[index]\nbucket_width = 30\n\n[histogram]\nbin_count = 50\n";
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.index.bucket_width, 30);
        assert_eq!(config.histogram.bin_count, 50);
        assert_eq!(config.histogram.sample_threshold, 100_000);
        assert_eq!(config.loader.mock_tick_count, 100);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tickscope.toml");
        std::fs::write(&path, "[loader]\nsource = \"csv\"\ndata_dir = \"/tmp/ticks\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.loader.source, LoaderSource::Csv);
        assert_eq!(config.loader.data_dir, "/tmp/ticks");

        let missing = Config::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[index]\nbucket_width = \"ten\"\n").unwrap();

        match Config::load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TICKSCOPE_BUCKET_WIDTH", "5"),
            ("TICKSCOPE_BIN_COUNT", "100"),
            ("TICKSCOPE_SOURCE", "csv"),
            ("TICKSCOPE_LOG_FORMAT", "json"),
            ("TICKSCOPE_MAX_SAMPLE_SIZE", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.index.bucket_width, 5);
        assert_eq!(config.histogram.bin_count, 100);
        assert_eq!(config.loader.source, LoaderSource::Csv);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.histogram.max_sample_size, 100_000);
    }
}
