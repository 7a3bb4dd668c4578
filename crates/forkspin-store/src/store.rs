//! The store trait.

use async_trait::async_trait;

use crate::{QueryResult, Row, Select, StoreError, Value};

/// Names of the server-side procedures the ad engine relies on.
pub mod procedures {
    /// Relative `views_count + 1` on one advertisement. Returns the new count.
    pub const INCREMENT_AD_VIEWS: &str = "increment_ad_views";
    /// Relative `clicks_count + 1` on one advertisement. Returns the new count.
    pub const INCREMENT_AD_CLICKS: &str = "increment_ad_clicks";
}

/// A hosted relational store.
///
/// Every call is a separate round-trip. Counter updates go through [`Store::call`]
/// so the arithmetic happens on the store side and concurrent writers never
/// lose increments.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the rows of `table` matching `select`.
    async fn select(&self, table: &str, select: &Select) -> Result<QueryResult, StoreError>;

    /// Append a row to `table`.
    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError>;

    /// Apply `changes` to the row of `table` whose `id` column equals `id`.
    ///
    /// Returns the number of rows touched.
    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<u64, StoreError>;

    /// Invoke a named server-side procedure.
    async fn call(&self, procedure: &str, args: &[Value]) -> Result<Value, StoreError>;
}
