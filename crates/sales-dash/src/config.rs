//! # CLI Configuration
//!
//! Environment-based configuration for the dashboard CLI.

use std::env;
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for CSV files and zip archives
    pub data_dir: PathBuf,

    /// Default number of entries per ranking
    pub top_n: usize,

    /// Logging level
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("SALES_DATA_DIR")
                .map_or_else(|_| PathBuf::from("data"), PathBuf::from),

            top_n: env::var("SALES_TOP_N")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
