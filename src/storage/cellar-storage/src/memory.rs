//! In-memory key-value service.
//!
//! Simulates a remote cluster inside the process. Every connector clone shares
//! the same bucket map, so two connections opened for the same bucket see each
//! other's writes, the way two clients of one cluster would.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::connection::{Connection, Connector, Document};
use crate::descriptor::ConnectionDescriptor;
use crate::error::StorageError;

type Buckets = Arc<RwLock<HashMap<String, HashMap<String, Document>>>>;

/// Connector for the in-memory service.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    buckets: Buckets,
}

impl MemoryConnector {
    /// Creates an empty in-memory service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents stored in `bucket`.
    pub fn document_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(bucket)
            .map_or(0, HashMap::len)
    }
}

impl Connector for MemoryConnector {
    type Connection = MemoryConnection;

    fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        bucket: &str,
    ) -> Result<MemoryConnection, StorageError> {
        descriptor.validate()?;
        if bucket.is_empty() {
            return Err(StorageError::InvalidInput("bucket cannot be empty".into()));
        }

        debug!(bucket = %bucket, address = %descriptor.address, "Opening in-memory bucket");

        Ok(MemoryConnection {
            bucket: bucket.to_string(),
            buckets: Arc::clone(&self.buckets),
        })
    }
}

/// Connection to one bucket of the in-memory service.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    bucket: String,
    buckets: Buckets,
}

impl MemoryConnection {
    /// Returns the bucket this connection is bound to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn get(&self, key: &str) -> Result<Option<Document>, StorageError> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        Ok(buckets
            .get(&self.bucket)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    async fn upsert(&self, key: &str, value: &Document) -> Result<(), StorageError> {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        buckets
            .entry(self.bucket.clone())
            .or_default()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(docs) = buckets.get_mut(&self.bucket) {
            docs.remove(key);
        }
        Ok(())
    }
}
