//! Store identity and per-store adapter configuration.

use cellar_storage::ConnectionDescriptor;
use serde::Deserialize;

use crate::error::AdapterError;

/// Adapter configuration for one store.
///
/// Deserialized from the host's per-store adapter section:
///
/// ```json
/// {
///     "connection": { "address": "couchbase://10.0.0.1" },
///     "namespace": "orders-v2"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Descriptor passed verbatim to the connector.
    pub connection: ConnectionDescriptor,
    /// Key prefix; defaults to the store identity.
    #[serde(default)]
    pub namespace: Option<String>,
}

impl StoreConfig {
    /// Creates a configuration without an explicit namespace.
    pub fn new(connection: ConnectionDescriptor) -> Self {
        Self {
            connection,
            namespace: None,
        }
    }

    /// Sets the namespace used instead of the store identity.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Parses and validates a JSON configuration section.
    pub fn from_json(json: &str) -> Result<Self, AdapterError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AdapterError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), AdapterError> {
        self.connection
            .validate()
            .map_err(|e| AdapterError::InvalidConfig(e.to_string()))?;

        if let Some(namespace) = &self.namespace {
            if namespace.trim().is_empty() {
                return Err(AdapterError::InvalidConfig(
                    "namespace cannot be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

/// A logical store as seen by the adapter: its identity and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    id: String,
    config: StoreConfig,
}

impl Store {
    /// Creates a store after validating its identity and configuration.
    pub fn new(id: impl Into<String>, config: StoreConfig) -> Result<Self, AdapterError> {
        let id = id.into();
        if id.is_empty() {
            return Err(AdapterError::InvalidConfig(
                "store identity cannot be empty".into(),
            ));
        }
        config.validate()?;
        Ok(Self { id, config })
    }

    /// Store identity. Selects the connection and is the default namespace.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Adapter configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Prefix for every remote key of this store.
    pub fn namespace(&self) -> &str {
        self.config.namespace.as_deref().unwrap_or(&self.id)
    }
}
