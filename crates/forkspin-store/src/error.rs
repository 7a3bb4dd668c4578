//! Store error types.

use thiserror::Error;

/// Errors that can occur when talking to the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("Store operation failed: {0}")]
    Backend(String),

    /// The current actor is not allowed to write this row.
    #[error("Permission denied on {table}: {reason}")]
    PermissionDenied { table: String, reason: String },

    /// No such table.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// No such server-side procedure.
    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    /// Procedure was called with the wrong arguments.
    #[error("Invalid arguments for {procedure}: {reason}")]
    InvalidArguments { procedure: String, reason: String },

    /// Failed to deserialize a row.
    #[error("Deserialization error: {0}")]
    DeserializeError(String),

    /// Type conversion error.
    #[error("Type conversion error: {0}")]
    TypeError(String),

    /// No rows matched when one was expected.
    #[error("No rows returned")]
    NotFound,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::DeserializeError(e.to_string())
    }
}
