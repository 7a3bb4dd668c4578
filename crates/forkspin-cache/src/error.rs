//! Cache error types.

use thiserror::Error;

/// Errors that can occur when using the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be encoded, or a stored value has a different type.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another thread panicked while holding the cache lock.
    #[error("Cache lock poisoned")]
    Poisoned,
}
