//! Geocoding result cache.

use serde::{Deserialize, Serialize};

use crate::{cache_key, Cache, CacheError};

const PREFIX: &str = "geocode";

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Outcome of a lookup that has already happened.
///
/// A key with no entry at all has not been looked up yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Lookup {
    /// The geocoder returned a position.
    Found(Coordinates),
    /// The geocoder was asked and had nothing, or the request failed.
    NotFound,
}

/// Cache of place name to [`Lookup`].
///
/// Names are normalized (trimmed, lowercased) so the same place spelled with
/// different casing hits the same entry.
#[derive(Default)]
pub struct GeocodeCache {
    cache: Cache,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Previous outcome for `name`, or `None` if it was never looked up.
    pub fn get(&self, name: &str) -> Result<Option<Lookup>, CacheError> {
        self.cache.get(&Self::key(name))
    }

    /// Record a successful lookup.
    pub fn set_found(&self, name: &str, coordinates: Coordinates) -> Result<(), CacheError> {
        self.cache.set(&Self::key(name), &Lookup::Found(coordinates))
    }

    /// Record that `name` was looked up without a result.
    pub fn set_not_found(&self, name: &str) -> Result<(), CacheError> {
        self.cache.set(&Self::key(name), &Lookup::NotFound)
    }

    /// Whether `name` still needs a lookup.
    pub fn is_pending(&self, name: &str) -> Result<bool, CacheError> {
        Ok(!self.cache.exists(&Self::key(name))?)
    }

    /// Forget every negative result so those names are retried.
    ///
    /// Called at the start of a fresh page load. Returns how many entries
    /// were dropped.
    pub fn clear_misses(&self) -> Result<usize, CacheError> {
        let mut cleared = 0;
        for key in self.cache.keys()? {
            let in_namespace = key
                .strip_prefix(PREFIX)
                .is_some_and(|rest| rest.starts_with(':'));
            if !in_namespace {
                continue;
            }
            if let Some(Lookup::NotFound) = self.cache.get::<Lookup>(&key)? {
                self.cache.delete(&key)?;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    fn key(name: &str) -> String {
        cache_key!(PREFIX, name.trim().to_lowercase())
    }
}
