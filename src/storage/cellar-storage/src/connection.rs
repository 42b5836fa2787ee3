//! Connection and connector traits.

use async_trait::async_trait;

use crate::descriptor::ConnectionDescriptor;
use crate::error::StorageError;

/// A record payload as stored by the remote service.
///
/// Documents are opaque to the adapter and passed through unchanged.
pub type Document = serde_json::Value;

/// A live session against one bucket of a remote key-value service.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Reads the document stored under `key`. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Document>, StorageError>;

    /// Inserts or replaces the document stored under `key`.
    async fn upsert(&self, key: &str, value: &Document) -> Result<(), StorageError>;

    /// Removes the document stored under `key`.
    ///
    /// Removing a key that does not exist is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Opens connections to a remote key-value service.
///
/// `open` is synchronous and must not block on network I/O: implementations
/// hand back a connection that establishes itself lazily on first use. Short
/// blocking filesystem work (creating a data directory) is allowed. The
/// client registry relies on this to create connections while holding its lock.
pub trait Connector: Send + Sync {
    /// The connection type produced by this connector.
    type Connection: Connection + 'static;

    /// Opens a connection to `bucket` using the given descriptor.
    fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        bucket: &str,
    ) -> Result<Self::Connection, StorageError>;
}
