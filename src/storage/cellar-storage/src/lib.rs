//! # Cellar Storage
//!
//! Connection layer between the Cellar adapter and a remote key-value service.
//!
//! Provides the [`Connection`] and [`Connector`] traits every backend implements,
//! the [`ConnectionDescriptor`] handed to connectors, and an in-memory backend.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod connection;
pub mod descriptor;
pub mod error;
pub mod memory;

pub use connection::{Connection, Connector, Document};
pub use descriptor::{ConnectionDescriptor, Credentials};
pub use error::StorageError;
pub use memory::{MemoryConnection, MemoryConnector};
