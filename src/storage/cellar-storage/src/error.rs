//! Storage error types.

use thiserror::Error;

/// Errors reported by a remote key-value connection.
///
/// A missing key is not an error: connections report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection could not be opened or was lost.
    #[error("connection error: {0}")]
    Connection(String),

    /// Document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Remote query failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Invalid key, bucket, or descriptor.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}
