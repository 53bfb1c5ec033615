//! Screening run configuration (TOML).
//!
//! ```toml
//! catalog = "groups.json"
//! sector = "Technology"
//!
//! [params]
//! rsi_upper = 70.0
//!
//! [data]
//! cache_dir = "data/cache"
//! max_age_hours = 24
//! lookback_days = 180
//! ```
//!
//! Every table and key is optional; missing values take their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use trendscan_core::data::StalenessPolicy;
use trendscan_core::engine::{ParamsError, ScreenParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid screen parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: i64 },
}

/// Where history comes from and how long it stays fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub cache_dir: PathBuf,
    pub max_age_hours: i64,
    /// Calendar days requested per fetch.
    pub lookback_days: i64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data/cache"),
            max_age_hours: 24,
            lookback_days: 180,
        }
    }
}

impl DataConfig {
    pub fn staleness(&self) -> StalenessPolicy {
        StalenessPolicy::hours(self.max_age_hours)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Group catalog path (`.json`, `.toml` or `.csv`). `None` uses the
    /// built-in catalog.
    pub catalog: Option<PathBuf>,
    /// Restrict the run to one sector (case-insensitive).
    pub sector: Option<String>,
    pub params: ScreenParams,
    pub data: DataConfig,
}

impl ScreenConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        for (field, value) in [
            ("data.max_age_hours", self.data.max_age_hours),
            ("data.lookback_days", self.data.lookback_days),
        ] {
            if value <= 0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }
}
