//! In-process store for development and testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::store::procedures;
use crate::{QueryResult, Row, Select, Store, StoreError, Value};

const ADVERTISEMENTS: &str = "advertisements";

/// In-memory [`Store`].
///
/// Procedures run under the table lock, so a relative increment is atomic with
/// respect to every other call on the same store, the same guarantee a hosted
/// backend gives its server-side functions.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    updates: Mutex<Vec<(String, String, Row)>>,
    guest_guarded: HashSet<String>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts into `table` from anonymous actors (rows whose
    /// `user_id` is null or missing).
    pub fn deny_guest_inserts(mut self, table: impl Into<String>) -> Self {
        self.guest_guarded.insert(table.into());
        self
    }

    /// Make every read fail, simulating an unreachable backend.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write (insert, update, procedure) fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the rows of `table`.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        lock(&self.tables)
            .map(|tables| tables.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Every update issued against `table`, as `(id, changes)` in issue order.
    pub fn updates(&self, table: &str) -> Vec<(String, Row)> {
        lock(&self.updates)
            .map(|log| {
                log.iter()
                    .filter(|(t, _, _)| t == table)
                    .map(|(_, id, changes)| (id.clone(), changes.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes unavailable".to_string()));
        }
        Ok(())
    }

    fn increment(&self, procedure: &str, column: &str, args: &[Value]) -> Result<Value, StoreError> {
        let id = match args {
            [Value::Text(id)] => id,
            _ => {
                return Err(StoreError::InvalidArguments {
                    procedure: procedure.to_string(),
                    reason: "expected a single ad id".to_string(),
                })
            }
        };

        let mut tables = lock(&self.tables)?;
        let row = tables
            .get_mut(ADVERTISEMENTS)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| r.get("id").and_then(Value::as_text) == Some(id.as_str()))
            })
            .ok_or(StoreError::NotFound)?;

        let next = row.get(column).and_then(Value::as_integer).unwrap_or(0) + 1;
        row.set(column, Value::Integer(next));
        Ok(Value::Integer(next))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, table: &str, select: &Select) -> Result<QueryResult, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("reads unavailable".to_string()));
        }

        let tables = lock(&self.tables)?;
        let rows = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| select.matches(row))
                    .map(|row| {
                        if select.columns.is_empty() {
                            row.clone()
                        } else {
                            row.project(&select.columns)
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(QueryResult::new(rows))
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError> {
        self.check_writable()?;

        let is_guest = row.get("user_id").map_or(true, Value::is_null);
        if is_guest && self.guest_guarded.contains(table) {
            return Err(StoreError::PermissionDenied {
                table: table.to_string(),
                reason: "anonymous actors cannot insert".to_string(),
            });
        }

        lock(&self.tables)?
            .entry(table.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn update(&self, table: &str, id: &str, changes: Row) -> Result<u64, StoreError> {
        self.check_writable()?;

        let mut tables = lock(&self.tables)?;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;

        let mut touched = 0;
        for row in rows
            .iter_mut()
            .filter(|r| r.get("id").and_then(Value::as_text) == Some(id))
        {
            row.merge(&changes);
            touched += 1;
        }

        lock(&self.updates)?.push((table.to_string(), id.to_string(), changes));
        Ok(touched)
    }

    async fn call(&self, procedure: &str, args: &[Value]) -> Result<Value, StoreError> {
        self.check_writable()?;

        match procedure {
            procedures::INCREMENT_AD_VIEWS => self.increment(procedure, "views_count", args),
            procedures::INCREMENT_AD_CLICKS => self.increment(procedure, "clicks_count", args),
            other => Err(StoreError::UnknownProcedure(other.to_string())),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{params, Condition};
    use std::sync::Arc;

    fn ad(id: &str, views: i64) -> Row {
        Row::from_pairs([
            ("id", Value::from(id)),
            ("views_count", Value::Integer(views)),
            ("clicks_count", Value::Integer(0)),
            ("is_active", Value::Bool(true)),
        ])
    }

    #[tokio::test]
    async fn test_insert_and_select() {
        let store = MemoryStore::new();
        store.insert(ADVERTISEMENTS, ad("a", 0)).await.unwrap();
        store.insert(ADVERTISEMENTS, ad("b", 5)).await.unwrap();

        let result = store
            .select(
                ADVERTISEMENTS,
                &Select::new().with(Condition::gte("views_count", 1)).columns(["id"]),
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        let row = result.first().unwrap();
        assert_eq!(row.columns(), &["id".to_string()]);
        assert_eq!(row.get("id").and_then(Value::as_text), Some("b"));
    }

    #[tokio::test]
    async fn test_select_unknown_table_is_empty() {
        let store = MemoryStore::new();
        let result = store.select("nothing", &Select::new()).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_increment_procedure() {
        let store = MemoryStore::new();
        store.insert(ADVERTISEMENTS, ad("a", 4)).await.unwrap();

        let views = store
            .call(procedures::INCREMENT_AD_VIEWS, params!["a"])
            .await
            .unwrap();
        assert_eq!(views, Value::Integer(5));

        let clicks = store
            .call(procedures::INCREMENT_AD_CLICKS, params!["a"])
            .await
            .unwrap();
        assert_eq!(clicks, Value::Integer(1));
    }

    #[tokio::test]
    async fn test_increment_unknown_ad() {
        let store = MemoryStore::new();
        let err = store
            .call(procedures::INCREMENT_AD_VIEWS, params!["missing"])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_unknown_procedure() {
        let store = MemoryStore::new();
        let err = store.call("drop_everything", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownProcedure(_)));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        store.insert(ADVERTISEMENTS, ad("a", 0)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.call(procedures::INCREMENT_AD_VIEWS, params!["a"]).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = store.rows(ADVERTISEMENTS);
        assert_eq!(rows[0].get("views_count"), Some(&Value::Integer(50)));
    }

    #[tokio::test]
    async fn test_guest_insert_denied() {
        let store = MemoryStore::new().deny_guest_inserts("ad_interactions");

        let guest = Row::from_pairs([("ad_id", Value::from("a")), ("user_id", Value::Null)]);
        let err = store.insert("ad_interactions", guest).await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));

        let member = Row::from_pairs([("ad_id", Value::from("a")), ("user_id", Value::from("u1"))]);
        store.insert("ad_interactions", member).await.unwrap();
        assert_eq!(store.rows("ad_interactions").len(), 1);
    }

    #[tokio::test]
    async fn test_update_is_logged() {
        let store = MemoryStore::new();
        store.insert(ADVERTISEMENTS, ad("a", 0)).await.unwrap();

        let touched = store
            .update(
                ADVERTISEMENTS,
                "a",
                Row::from_pairs([("is_active", Value::Bool(false))]),
            )
            .await
            .unwrap();

        assert_eq!(touched, 1);
        assert_eq!(store.updates(ADVERTISEMENTS).len(), 1);
        assert_eq!(
            store.rows(ADVERTISEMENTS)[0].get("is_active"),
            Some(&Value::Bool(false))
        );
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let store = MemoryStore::new();
        store.set_fail_reads(true);
        assert!(store.select(ADVERTISEMENTS, &Select::new()).await.is_err());

        store.set_fail_writes(true);
        assert!(store.insert(ADVERTISEMENTS, ad("a", 0)).await.is_err());
    }
}
