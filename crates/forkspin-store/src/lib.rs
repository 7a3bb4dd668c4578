//! Relational store abstraction for Forkspin.
//!
//! The hosted data backend is an external collaborator. This crate describes
//! the row and procedure operations the ad engine needs from it and ships an
//! in-process implementation for development and tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use forkspin_store::{params, Condition, MemoryStore, Row, Select, Store};
//!
//! let store = MemoryStore::new();
//!
//! store.insert("advertisements", Row::from_pairs([
//!     ("id", "ad-1".into()),
//!     ("views_count", 0i64.into()),
//! ])).await?;
//!
//! // Relative increment performed by the store, never by the caller
//! store.call("increment_ad_views", params!["ad-1"]).await?;
//!
//! let rows = store
//!     .select("advertisements", &Select::new().with(Condition::eq("id", "ad-1")))
//!     .await?;
//! ```

mod error;
mod memory;
mod query;
mod store;
mod types;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use query::{Condition, Select};
pub use store::{procedures, Store};
pub use types::{QueryResult, Row, Value};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        params, Condition, MemoryStore, QueryResult, Row, Select, Store, StoreError, Value,
    };
}

/// Create a parameter list for procedure calls.
///
/// # Example
///
/// ```rust,ignore
/// use forkspin_store::params;
///
/// let params = params!["ad-1", 42];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[]
    };
    ($($param:expr),+ $(,)?) => {
        &[$($crate::Value::from($param)),+]
    };
}
