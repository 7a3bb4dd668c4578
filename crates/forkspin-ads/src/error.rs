//! Ad engine error types.

use thiserror::Error;

/// Errors that can occur in placement, ledger and listing operations.
#[derive(Error, Debug)]
pub enum AdsError {
    /// Campaign not found.
    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    /// Placement key could not be parsed.
    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),

    /// Interaction type not usable here.
    #[error("Invalid interaction: {0}")]
    InvalidInteraction(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Geocoder failed for one lookup.
    #[error("Geocoding failed for {query}: {reason}")]
    Geocode { query: String, reason: String },

    /// Store error.
    #[error("Store error: {0}")]
    Store(String),

    /// Cache error.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<forkspin_store::StoreError> for AdsError {
    fn from(e: forkspin_store::StoreError) -> Self {
        AdsError::Store(e.to_string())
    }
}

impl From<forkspin_cache::CacheError> for AdsError {
    fn from(e: forkspin_cache::CacheError) -> Self {
        AdsError::Cache(e.to_string())
    }
}

impl From<serde_json::Error> for AdsError {
    fn from(e: serde_json::Error) -> Self {
        AdsError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for AdsError {
    fn from(e: toml::de::Error) -> Self {
        AdsError::Config(e.to_string())
    }
}
