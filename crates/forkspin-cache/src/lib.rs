//! Type-safe key-value caching layer for Forkspin.
//!
//! Provides a small in-process cache with automatic JSON serialization, and
//! the geocode cache built on it. Caches are explicit objects handed to
//! whoever needs them; nothing here is process-global.
//!
//! # Example
//!
//! ```rust,ignore
//! use forkspin_cache::{Coordinates, GeocodeCache, Lookup};
//!
//! let geocodes = GeocodeCache::new();
//!
//! geocodes.set_not_found("Unknown Diner")?;
//! assert_eq!(geocodes.get("Unknown Diner")?, Some(Lookup::NotFound));
//! assert_eq!(geocodes.get("Never Asked")?, None);
//! ```

mod error;
mod geocode;
mod kv;

pub use error::CacheError;
pub use geocode::{Coordinates, GeocodeCache, Lookup};
pub use kv::Cache;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, Coordinates, GeocodeCache, Lookup};
}
