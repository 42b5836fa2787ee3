//! Per-store connection registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use cellar_storage::{ConnectionDescriptor, Connector, StorageError};
use tracing::info;

/// Holds exactly one connection per store identity.
///
/// Connections are opened lazily on first use and kept for the lifetime of
/// the registry; there is no eviction. The registry is shared through an
/// `Arc` by every [`Adapter`](crate::Adapter) that should reuse its
/// connections. Tests create a fresh registry per case.
pub struct ClientRegistry<C: Connector> {
    connector: C,
    clients: Mutex<HashMap<String, Arc<C::Connection>>>,
}

impl<C: Connector> ClientRegistry<C> {
    /// Creates an empty registry opening connections through `connector`.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the connection for `identity`, opening it if needed.
    ///
    /// The descriptor is only used by the call that opens the connection;
    /// later calls get the existing connection whatever descriptor they pass.
    /// Opening happens under the registry lock and never awaits, so concurrent
    /// callers cannot open two connections for the same identity. A failed
    /// open leaves nothing behind and the next call tries again.
    pub fn get_or_create(
        &self,
        identity: &str,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Arc<C::Connection>, StorageError> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(connection) = clients.get(identity) {
            return Ok(Arc::clone(connection));
        }

        let connection = Arc::new(self.connector.open(descriptor, identity)?);
        clients.insert(identity.to_string(), Arc::clone(&connection));

        info!(store = %identity, address = %descriptor.address, "Connection established");

        Ok(connection)
    }

    /// Returns the connection for `identity` if one has been opened.
    pub fn get(&self, identity: &str) -> Option<Arc<C::Connection>> {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    /// Returns true if a connection has been opened for `identity`.
    pub fn contains(&self, identity: &str) -> bool {
        self.get(identity).is_some()
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no connection has been opened yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The connector used to open connections.
    pub fn connector(&self) -> &C {
        &self.connector
    }
}
