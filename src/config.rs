use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::aggregator::DEFAULT_NUM_PERIODS;
use crate::error::ConfigError;
use crate::filter::DEFAULT_TABLE_WINDOW;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const API_URL_ENV: &str = "FRAUD_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_base_url: String,
    pub timeout_ms: u64,
    /// Number of sequential buckets in the fraud-over-time chart.
    pub num_periods: usize,
    /// Rows shown by the First/Last table window.
    pub table_window: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            num_periods: DEFAULT_NUM_PERIODS,
            table_window: DEFAULT_TABLE_WINDOW,
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "loaded dashboard config");
        Self::from_toml_str(&raw)
    }

    /// File (if given) first, then `FRAUD_API_URL` from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_api_url_override(std::env::var(API_URL_ENV).ok())
    }

    pub fn with_api_url_override(mut self, url: Option<String>) -> Result<Self, ConfigError> {
        if let Some(url) = url.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url is empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".to_string()));
        }
        if self.num_periods == 0 {
            return Err(ConfigError::Invalid("num_periods must be at least 1".to_string()));
        }
        Ok(())
    }
}
