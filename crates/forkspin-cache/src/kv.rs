//! Key-Value store wrapper with automatic serialization.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::CacheError;
use serde::{de::DeserializeOwned, Serialize};

/// Type-safe in-process cache.
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Cloning a handle is not supported;
/// share it behind an `Arc` instead so there is exactly one owner.
#[derive(Default)]
pub struct Cache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl Cache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let coords: Option<Coordinates> = cache.get("geocode:sushi place")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.entries()?.get(key) {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.entries()?.insert(key.to_string(), bytes);
        Ok(())
    }

    /// Delete a value from the cache.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries()?.remove(key);
        Ok(())
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries()?.contains_key(key))
    }

    /// Get all keys in the cache.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.entries()?.keys().cloned().collect())
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Poisoned)
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust,ignore
/// let key = cache_key!("geocode", name);
/// // Returns "geocode:<name>"
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let cache = Cache::new();
        cache.set("k", &vec![1, 2, 3]).unwrap();

        let value: Option<Vec<i32>> = cache.get("k").unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
        assert!(cache.exists("k").unwrap());

        cache.delete("k").unwrap();
        assert!(!cache.exists("k").unwrap());
        assert_eq!(cache.get::<Vec<i32>>("k").unwrap(), None);
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let cache = Cache::new();
        cache.set("k", &"text").unwrap();
        assert!(cache.get::<i64>("k").is_err());
    }

    #[test]
    fn test_cache_key_macro() {
        let id = 42;
        assert_eq!(cache_key!("geocode", "tokyo", id), "geocode:tokyo:42");
    }
}
