//! # Cellar Storage - SQLite Backend
//!
//! SQLite implementation of the remote key-value service with bucket isolation.
//! Each bucket gets its own database file under the descriptor's address.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use cellar_storage::{Connection, ConnectionDescriptor, Connector, Document, StorageError};

/// Maximum pooled connections per bucket.
const MAX_CONNECTIONS: u32 = 5;

/// Opens [`SqliteBackend`] connections.
///
/// The descriptor's `address` is the directory holding bucket databases;
/// credentials are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl SqliteConnector {
    /// Creates a new connector.
    pub fn new() -> Self {
        Self
    }
}

impl Connector for SqliteConnector {
    type Connection = SqliteBackend;

    fn open(
        &self,
        descriptor: &ConnectionDescriptor,
        bucket: &str,
    ) -> Result<SqliteBackend, StorageError> {
        descriptor.validate()?;
        SqliteBackend::open(&descriptor.address, bucket)
    }
}

/// SQLite storage for one bucket.
///
/// Each bucket lives at `{base_path}/{bucket}.db`. The pool connects lazily
/// and the schema is created on the first operation.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
    bucket: String,
    db_path: PathBuf,
    migrated: Arc<OnceCell<()>>,
}

impl SqliteBackend {
    /// Opens a SQLite database for a bucket without touching the database.
    ///
    /// # Arguments
    ///
    /// * `base_path` - Directory where bucket databases are stored
    /// * `bucket` - Bucket name (must match `[A-Za-z0-9_-]+`)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Bucket name is invalid
    /// - Called outside a Tokio runtime (the pool spawns maintenance tasks)
    /// - Directory cannot be created
    pub fn open(base_path: impl AsRef<Path>, bucket: &str) -> Result<Self, StorageError> {
        Self::validate_bucket(bucket)?;

        if Handle::try_current().is_err() {
            return Err(StorageError::Connection("no async runtime".into()));
        }

        let base = base_path.as_ref();
        std::fs::create_dir_all(base).map_err(|e| {
            StorageError::Connection(format!("failed to create directory: {e}"))
        })?;

        let db_path = base.join(format!("{bucket}.db"));

        debug!(bucket = %bucket, path = %db_path.display(), "Opening SQLite bucket");

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_lazy_with(options);

        Ok(Self {
            pool,
            bucket: bucket.to_string(),
            db_path,
            migrated: Arc::new(OnceCell::new()),
        })
    }

    /// Validates that a bucket name is safe to use as a file name.
    ///
    /// Only allows: ASCII letters, digits, underscore, hyphen.
    fn validate_bucket(bucket: &str) -> Result<(), StorageError> {
        if bucket.is_empty() {
            return Err(StorageError::InvalidInput("bucket cannot be empty".into()));
        }

        if bucket.len() > 64 {
            return Err(StorageError::InvalidInput("bucket name too long".into()));
        }

        let valid = bucket
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if !valid {
            return Err(StorageError::InvalidInput(
                "bucket must match [A-Za-z0-9_-]+".into(),
            ));
        }

        Ok(())
    }

    /// Returns the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the database file path.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Creates the schema once per backend.
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.migrated
            .get_or_try_init(|| async {
                debug!(bucket = %self.bucket, "Running database migrations");

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS kv_store (
                        key        TEXT PRIMARY KEY,
                        value      BLOB NOT NULL,
                        updated_at INTEGER NOT NULL
                    )
                    "#,
                )
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Connection(format!("migration failed: {e}")))?;

                info!(bucket = %self.bucket, "SQLite bucket ready");
                Ok::<(), StorageError>(())
            })
            .await?;
        Ok(())
    }

    /// Returns the current Unix timestamp.
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// Lists keys starting with `prefix`, sorted.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.ensure_schema().await?;

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT key FROM kv_store WHERE substr(key, 1, length(?)) = ? ORDER BY key",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(rows.into_iter().map(|(k,)| k).collect())
    }
}

#[async_trait]
impl Connection for SqliteBackend {
    async fn get(&self, key: &str) -> Result<Option<Document>, StorageError> {
        self.ensure_schema().await?;

        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        row.map(|(bytes,)| serde_json::from_slice(&bytes).map_err(StorageError::from))
            .transpose()
    }

    async fn upsert(&self, key: &str, value: &Document) -> Result<(), StorageError> {
        self.ensure_schema().await?;

        let bytes = serde_json::to_vec(value)?;

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(bytes)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_schema().await?;

        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
