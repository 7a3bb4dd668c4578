//! Engine configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AdsError;

/// Tunables for the listing and geocode fill-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsConfig {
    /// Items added to the visible window per load-more.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Minimum spacing between geocoder requests, in milliseconds.
    #[serde(default = "default_geocode_interval_ms")]
    pub geocode_interval_ms: u64,

    /// Lookups per geocode batch.
    #[serde(default = "default_geocode_batch_size")]
    pub geocode_batch_size: usize,

    /// Resolve the weekly "most popular" slot alongside the pinned card.
    #[serde(default = "default_include_weekly")]
    pub include_weekly: bool,
}

fn default_page_size() -> usize {
    10
}

fn default_geocode_interval_ms() -> u64 {
    1100
}

fn default_geocode_batch_size() -> usize {
    5
}

fn default_include_weekly() -> bool {
    true
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            geocode_interval_ms: default_geocode_interval_ms(),
            geocode_batch_size: default_geocode_batch_size(),
            include_weekly: default_include_weekly(),
        }
    }
}

impl AdsConfig {
    /// Parse TOML text and validate it.
    pub fn from_toml(content: &str) -> Result<Self, AdsError> {
        let config: AdsConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON text and validate it.
    pub fn from_json(content: &str) -> Result<Self, AdsError> {
        let config: AdsConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AdsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AdsError::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), AdsError> {
        if self.page_size == 0 {
            return Err(AdsError::Config("page_size must be at least 1".to_string()));
        }
        if self.geocode_batch_size == 0 {
            return Err(AdsError::Config(
                "geocode_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Geocoder request spacing.
    pub fn geocode_interval(&self) -> Duration {
        Duration::from_millis(self.geocode_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdsConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.geocode_interval(), Duration::from_millis(1100));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AdsConfig::from_toml("page_size = 20").unwrap();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.geocode_batch_size, 5);
        assert!(config.include_weekly);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AdsConfig::load("/nonexistent/forkspin.toml").unwrap_err();
        assert!(matches!(err, AdsError::Config(_)));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = AdsConfig::from_json(r#"{"page_size": 0}"#).unwrap_err();
        assert!(matches!(err, AdsError::Config(_)));
    }
}
