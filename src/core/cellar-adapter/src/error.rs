//! Adapter error types.

use cellar_storage::{Document, StorageError};
use thiserror::Error;

use crate::deferred::Abandoned;

/// Failures a dispatched operation can settle with.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The remote call failed. The storage error is passed through unchanged.
    #[error(transparent)]
    Remote(#[from] StorageError),

    /// A single-record fetch found no value at the remote key.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A whole-collection fetch found no value: the collection has not been
    /// written yet.
    #[error("collection is empty: {0}")]
    EmptyCollection(String),

    /// Store identity or configuration is invalid.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    /// Dispatch was called outside of a Tokio runtime.
    #[error("no async runtime available to run the operation")]
    NoRuntime,

    /// The operation was dropped before it settled.
    #[error("operation abandoned before completion")]
    Abandoned,
}

impl AdapterError {
    /// Returns true if the failure means "no data" rather than a broken call.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            AdapterError::NotFound(_) | AdapterError::EmptyCollection(_)
        )
    }

    /// Returns the empty-collection marker for [`AdapterError::EmptyCollection`].
    ///
    /// Hosts that load a whole store at once can use it as the initial
    /// contents instead of special-casing the failure.
    pub fn collection_marker(&self) -> Option<Document> {
        match self {
            AdapterError::EmptyCollection(_) => Some(Document::Array(Vec::new())),
            _ => None,
        }
    }
}

impl From<Abandoned> for AdapterError {
    fn from(_: Abandoned) -> Self {
        AdapterError::Abandoned
    }
}
