//! # Cellar Adapter
//!
//! Persistence adapter for in-memory collection stores.
//!
//! A host store hands the adapter one of three operations (fetch, write,
//! remove) together with an optional record key. The adapter resolves the
//! store's single connection through the [`ClientRegistry`], derives the
//! remote key, issues exactly one remote call, and returns an awaitable
//! [`Pending`] result without blocking the caller.
//!
//! ## Remote keys
//!
//! Keys are scoped by the store's namespace (its configured namespace, or its
//! identity). A record key `42` in store `orders` lives at `orders_42`; the
//! whole-collection document lives at `orders`.
//!
//! ## Results
//!
//! - fetch: the stored [`Document`](cellar_storage::Document),
//!   [`AdapterError::NotFound`] for a missing record, or
//!   [`AdapterError::EmptyCollection`] for a missing collection document
//! - write / remove: [`Outcome::Acknowledged`]
//! - remote failures: [`AdapterError::Remote`], carrying the storage error as-is

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod deferred;
pub mod dispatcher;
pub mod error;
pub mod key;
pub mod registry;

pub use config::{Store, StoreConfig};
pub use deferred::{deferred, Abandoned, Pending, Settler};
pub use dispatcher::{Adapter, Operation, Outcome};
pub use error::AdapterError;
pub use key::build_key;
pub use registry::ClientRegistry;
