//! Operation dispatcher.
//!
//! The [`Adapter`] is the entry point for host stores. Every dispatch issues
//! exactly one remote call on the current Tokio runtime and returns a
//! [`Pending`] result straight away; nothing is retried.

use std::sync::Arc;

use cellar_storage::{Connection, Connector, Document};
use tokio::runtime::Handle;
use tracing::debug;

use crate::config::Store;
use crate::deferred::{deferred, Pending};
use crate::error::AdapterError;
use crate::key::build_key;
use crate::registry::ClientRegistry;

/// An operation requested by a host store.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Read the record, or the whole collection when no record key is given.
    Fetch,
    /// Insert or replace the record with the given payload.
    Write(Document),
    /// Delete the record.
    Remove,
}

impl Operation {
    /// Operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Fetch => "fetch",
            Operation::Write(_) => "write",
            Operation::Remove => "remove",
        }
    }
}

/// Successful result of a dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The fetched document.
    Value(Document),
    /// A write or remove was applied. Carries no payload.
    Acknowledged,
}

impl Outcome {
    /// Returns the fetched document, if any.
    pub fn into_value(self) -> Option<Document> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::Acknowledged => None,
        }
    }

    /// Returns true for a write/remove acknowledgement.
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, Outcome::Acknowledged)
    }

    /// Converts to the document handed back to the host: the fetched value,
    /// or `true` for an acknowledgement.
    pub fn into_document(self) -> Document {
        match self {
            Outcome::Value(value) => value,
            Outcome::Acknowledged => Document::Bool(true),
        }
    }
}

/// Persistence adapter dispatching store operations to a remote service.
pub struct Adapter<C: Connector> {
    registry: Arc<ClientRegistry<C>>,
}

impl<C: Connector> Clone for Adapter<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<C: Connector> Adapter<C> {
    /// Creates an adapter sharing the given registry.
    pub fn new(registry: Arc<ClientRegistry<C>>) -> Self {
        Self { registry }
    }

    /// Creates an adapter with a fresh registry around `connector`.
    pub fn with_connector(connector: C) -> Self {
        Self::new(Arc::new(ClientRegistry::new(connector)))
    }

    /// The registry holding this adapter's connections.
    pub fn registry(&self) -> &Arc<ClientRegistry<C>> {
        &self.registry
    }

    /// Dispatches `operation` against `store`.
    ///
    /// `record_key` selects one record; without it the operation addresses the
    /// document holding the whole collection. Returns immediately: the
    /// connection is resolved and the remote call is spawned on the current
    /// Tokio runtime, which settles the returned result when it completes.
    /// Called outside a runtime, the result settles with
    /// [`AdapterError::NoRuntime`].
    pub fn dispatch(
        &self,
        store: &Store,
        operation: Operation,
        record_key: Option<&str>,
    ) -> Pending<Outcome, AdapterError> {
        let (settler, pending) = deferred();

        let Ok(runtime) = Handle::try_current() else {
            settler.reject(AdapterError::NoRuntime);
            return pending;
        };

        let connection = match self
            .registry
            .get_or_create(store.id(), &store.config().connection)
        {
            Ok(connection) => connection,
            Err(e) => {
                settler.reject(e.into());
                return pending;
            },
        };

        let key = build_key(store.namespace(), record_key);
        let record = record_key.is_some();

        debug!(
            store = %store.id(),
            operation = operation.name(),
            key = %key,
            "Dispatching operation"
        );

        runtime.spawn(async move {
            let result = execute(&*connection, operation, &key, record).await;
            settler.settle(result);
        });

        pending
    }

    /// Fetches one record, or the whole collection when `record_key` is `None`.
    ///
    /// Only a stored JSON `null` counts as no value; `false`, `0` and `""` are
    /// returned as values.
    pub fn fetch(
        &self,
        store: &Store,
        record_key: Option<&str>,
    ) -> Pending<Outcome, AdapterError> {
        self.dispatch(store, Operation::Fetch, record_key)
    }

    /// Writes `data` to one record, or to the collection document when
    /// `record_key` is `None`.
    pub fn write(
        &self,
        store: &Store,
        record_key: Option<&str>,
        data: Document,
    ) -> Pending<Outcome, AdapterError> {
        self.dispatch(store, Operation::Write(data), record_key)
    }

    /// Removes one record, or the collection document when `record_key` is `None`.
    pub fn remove(
        &self,
        store: &Store,
        record_key: Option<&str>,
    ) -> Pending<Outcome, AdapterError> {
        self.dispatch(store, Operation::Remove, record_key)
    }
}

/// Issues the remote call for `operation` and maps its outcome.
async fn execute<K>(
    connection: &K,
    operation: Operation,
    key: &str,
    record: bool,
) -> Result<Outcome, AdapterError>
where
    K: Connection + ?Sized,
{
    match operation {
        Operation::Fetch => match connection.get(key).await? {
            // A stored null counts as no value.
            Some(value) if !value.is_null() => Ok(Outcome::Value(value)),
            _ if record => Err(AdapterError::NotFound(key.to_string())),
            _ => Err(AdapterError::EmptyCollection(key.to_string())),
        },
        Operation::Write(data) => {
            connection.upsert(key, &data).await?;
            Ok(Outcome::Acknowledged)
        },
        Operation::Remove => {
            connection.remove(key).await?;
            Ok(Outcome::Acknowledged)
        },
    }
}
