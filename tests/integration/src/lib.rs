//! Integration tests for the Cellar adapter.
//!
//! These tests drive the adapter end to end against the SQLite-backed service.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cellar_adapter::{Adapter, ClientRegistry, Store, StoreConfig};
use cellar_storage::ConnectionDescriptor;
use cellar_storage_sqlite::SqliteConnector;
use tempfile::TempDir;

// ============================================================================
// Test Cluster
// ============================================================================

/// A SQLite-backed service rooted in its own temporary directory.
pub struct TestCluster {
    data_dir: TempDir,
}

impl TestCluster {
    /// Creates an empty cluster.
    pub fn start() -> Result<Self> {
        init_tracing();
        let data_dir = TempDir::new().context("Failed to create temp dir")?;
        Ok(Self { data_dir })
    }

    /// Directory holding the bucket databases.
    pub fn path(&self) -> &Path {
        self.data_dir.path()
    }

    /// Descriptor pointing at this cluster.
    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor::new(self.path().to_string_lossy())
    }

    /// Creates a store using this cluster.
    pub fn store(&self, id: &str) -> Result<Store> {
        Store::new(id, StoreConfig::new(self.descriptor()))
            .with_context(|| format!("Failed to create store {id}"))
    }

    /// Creates a store with an explicit namespace.
    pub fn namespaced_store(&self, id: &str, namespace: &str) -> Result<Store> {
        let config = StoreConfig::new(self.descriptor()).with_namespace(namespace);
        Store::new(id, config).with_context(|| format!("Failed to create store {id}"))
    }

    /// Creates an adapter with its own registry, as a freshly started process would.
    pub fn adapter(&self) -> Adapter<SqliteConnector> {
        Adapter::new(Arc::new(ClientRegistry::new(SqliteConnector::new())))
    }
}

/// Installs a test subscriber once. Honors `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cellar_adapter::{AdapterError, Outcome};
    use cellar_storage::StorageError;
    use serde_json::json;

    #[tokio::test]
    async fn test_record_lifecycle() {
        let cluster = TestCluster::start().unwrap();
        let adapter = cluster.adapter();
        let orders = cluster.store("orders").unwrap();

        // 1. Nothing stored yet
        let result = adapter.fetch(&orders, Some("42")).await;
        assert!(matches!(result, Err(AdapterError::NotFound(_))));

        // 2. Write
        let payload = json!({"id": 42, "items": ["A-1", "B-7"], "paid": false});
        let written = adapter
            .write(&orders, Some("42"), payload.clone())
            .await
            .unwrap();
        assert_eq!(written, Outcome::Acknowledged);

        // 3. Read back
        let fetched = adapter.fetch(&orders, Some("42")).await.unwrap();
        assert_eq!(fetched, Outcome::Value(payload));

        // 4. Replace
        let updated = json!({"id": 42, "items": ["A-1"], "paid": true});
        adapter
            .write(&orders, Some("42"), updated.clone())
            .await
            .unwrap();
        let fetched = adapter.fetch(&orders, Some("42")).await.unwrap();
        assert_eq!(fetched.into_value(), Some(updated));

        // 5. Remove
        let removed = adapter.remove(&orders, Some("42")).await.unwrap();
        assert_eq!(removed.into_document(), json!(true));

        // 6. Gone: absent, not broken
        let err = adapter.fetch(&orders, Some("42")).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotFound(ref key) if key == "orders_42"));
    }

    #[tokio::test]
    async fn test_whole_collection_document() {
        let cluster = TestCluster::start().unwrap();
        let adapter = cluster.adapter();
        let orders = cluster.store("orders").unwrap();

        // Never written: empty collection, with a marker usable as initial contents
        let err = adapter.fetch(&orders, None).await.unwrap_err();
        assert!(matches!(err, AdapterError::EmptyCollection(ref key) if key == "orders"));
        let initial = err.collection_marker().unwrap();
        assert_eq!(initial, json!([]));

        // Persist the whole store as one document
        let contents = json!([["1", {"total": 10}], ["2", {"total": 25}]]);
        adapter
            .write(&orders, None, contents.clone())
            .await
            .unwrap();

        let fetched = adapter.fetch(&orders, None).await.unwrap();
        assert_eq!(fetched, Outcome::Value(contents));

        // Record keys and the collection document do not collide
        let result = adapter.fetch(&orders, Some("1")).await;
        assert!(matches!(result, Err(AdapterError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_namespace_scopes_keys_within_bucket() {
        let cluster = TestCluster::start().unwrap();
        let adapter = cluster.adapter();

        let current = cluster.store("orders").unwrap();
        let archive = cluster.namespaced_store("orders", "archive").unwrap();

        adapter
            .write(&current, Some("1"), json!("current"))
            .await
            .unwrap();

        // Same identity, so the first store's configuration and connection are reused
        let result = adapter.fetch(&archive, Some("1")).await;
        assert!(matches!(result, Err(AdapterError::NotFound(ref key)) if key == "archive_1"));

        adapter
            .write(&archive, Some("1"), json!("archived"))
            .await
            .unwrap();

        let current_value = adapter.fetch(&current, Some("1")).await.unwrap();
        let archived_value = adapter.fetch(&archive, Some("1")).await.unwrap();
        assert_eq!(current_value, Outcome::Value(json!("current")));
        assert_eq!(archived_value, Outcome::Value(json!("archived")));

        assert_eq!(adapter.registry().len(), 1);
        let connection = adapter.registry().get("orders").unwrap();
        let keys = connection.list("").await.unwrap();
        assert_eq!(keys, vec!["archive_1", "orders_1"]);
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let cluster = TestCluster::start().unwrap();
        let adapter = cluster.adapter();
        let orders = cluster.store("orders").unwrap();
        let users = cluster.store("users").unwrap();

        adapter.write(&orders, Some("1"), json!("o")).await.unwrap();
        adapter.write(&users, Some("1"), json!("u")).await.unwrap();

        assert_eq!(
            adapter.fetch(&orders, Some("1")).await.unwrap(),
            Outcome::Value(json!("o"))
        );
        assert_eq!(
            adapter.fetch(&users, Some("1")).await.unwrap(),
            Outcome::Value(json!("u"))
        );

        assert_eq!(adapter.registry().len(), 2);
        assert!(cluster.path().join("orders.db").exists());
        assert!(cluster.path().join("users.db").exists());
    }

    #[tokio::test]
    async fn test_data_survives_new_registry() {
        let cluster = TestCluster::start().unwrap();
        let orders = cluster.store("orders").unwrap();

        {
            let adapter = cluster.adapter();
            adapter
                .write(&orders, Some("7"), json!({"kept": true}))
                .await
                .unwrap();
        }

        let adapter = cluster.adapter();
        assert!(adapter.registry().is_empty());
        let fetched = adapter.fetch(&orders, Some("7")).await.unwrap();
        assert_eq!(fetched, Outcome::Value(json!({"kept": true})));
    }

    #[tokio::test]
    async fn test_concurrent_first_use_opens_one_connection() {
        let cluster = TestCluster::start().unwrap();
        let adapter = cluster.adapter();
        let orders = cluster.store("orders").unwrap();

        let first = adapter.fetch(&orders, None);
        let second = adapter.fetch(&orders, None);
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, Err(AdapterError::EmptyCollection(_))));
        assert!(matches!(second, Err(AdapterError::EmptyCollection(_))));
        assert_eq!(adapter.registry().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_writes() {
        let cluster = TestCluster::start().unwrap();
        let adapter = cluster.adapter();
        let orders = cluster.store("orders").unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let adapter = adapter.clone();
                let orders = orders.clone();
                tokio::spawn(async move {
                    let key = format!("{i}");
                    adapter.write(&orders, Some(&key), json!({"n": i})).await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), Outcome::Acknowledged);
        }

        assert_eq!(adapter.registry().len(), 1);
        let connection = adapter.registry().get("orders").unwrap();
        assert_eq!(connection.list("orders_").await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_invalid_bucket_is_a_remote_error() {
        let cluster = TestCluster::start().unwrap();
        let adapter = cluster.adapter();
        let store = cluster.store("orders/2024").unwrap();

        let result = adapter.fetch(&store, Some("1")).await;
        assert!(matches!(
            result,
            Err(AdapterError::Remote(StorageError::InvalidInput(_)))
        ));
        assert!(adapter.registry().is_empty());
    }

    #[test]
    fn test_registry_open_outside_runtime_is_an_error() {
        let cluster = TestCluster::start().unwrap();
        let registry = ClientRegistry::new(SqliteConnector::new());

        let result = registry.get_or_create("orders", &cluster.descriptor());
        assert!(matches!(result, Err(StorageError::Connection(ref msg)) if msg == "no async runtime"));
        assert!(registry.is_empty());

        // The lock is not poisoned: a later open inside a runtime succeeds.
        let descriptor = cluster.descriptor();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            registry.get_or_create("orders", &descriptor).unwrap();
            assert_eq!(registry.len(), 1);
        });
    }

    #[test]
    fn test_store_config_from_host_section() {
        let cluster = TestCluster::start().unwrap();
        let section = format!(
            r#"{{"connection": {{"address": {}}}, "namespace": "orders-v2"}}"#,
            serde_json::to_string(&cluster.path().to_string_lossy()).unwrap()
        );

        let config = StoreConfig::from_json(&section).unwrap();
        let store = Store::new("orders", config).unwrap();

        assert_eq!(store.namespace(), "orders-v2");
        assert_eq!(store.config().connection, cluster.descriptor());
    }
}
