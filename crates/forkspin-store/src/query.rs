//! Row selection conditions.

use crate::{Row, Value};
use std::cmp::Ordering;

/// A single predicate over one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Column equals value.
    Eq(String, Value),
    /// Column is one of the values.
    In(String, Vec<Value>),
    /// Column is less than or equal to value.
    Lte(String, Value),
    /// Column is greater than or equal to value.
    Gte(String, Value),
    /// Column is null.
    IsNull(String),
}

impl Condition {
    /// Create an equality condition.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq(column.into(), value.into())
    }

    /// Create a membership condition.
    pub fn one_of<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Condition::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    /// Create a `<=` condition.
    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Lte(column.into(), value.into())
    }

    /// Create a `>=` condition.
    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Gte(column.into(), value.into())
    }

    /// Check a row against this condition.
    ///
    /// A missing column behaves like null, and null never compares.
    pub fn matches(&self, row: &Row) -> bool {
        let get = |column: &str| row.get(column).cloned().unwrap_or(Value::Null);
        match self {
            Condition::Eq(column, value) => get(column).compare(value) == Some(Ordering::Equal),
            Condition::In(column, values) => {
                let current = get(column);
                values
                    .iter()
                    .any(|v| current.compare(v) == Some(Ordering::Equal))
            }
            Condition::Lte(column, value) => matches!(
                get(column).compare(value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::Gte(column, value) => matches!(
                get(column).compare(value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::IsNull(column) => get(column).is_null(),
        }
    }
}

/// A selection: which rows and which columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    /// Conditions, all of which must hold.
    pub conditions: Vec<Condition>,
    /// Columns to return. Empty means every column.
    pub columns: Vec<String>,
}

impl Select {
    /// Create a selection matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition.
    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Restrict the returned columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Check a row against every condition.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }
}
