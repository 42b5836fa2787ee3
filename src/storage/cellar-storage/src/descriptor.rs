//! Connection descriptors.

use std::fmt;

use serde::Deserialize;

use crate::error::StorageError;

/// Describes how to reach a remote key-value service.
///
/// The descriptor is passed verbatim to a [`Connector`](crate::Connector);
/// how `address` is interpreted is up to the backend (a cluster URL, a base
/// directory, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionDescriptor {
    /// Service address.
    pub address: String,
    /// Optional credentials.
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl ConnectionDescriptor {
    /// Creates a descriptor without credentials.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credentials: None,
        }
    }

    /// Sets the credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Validates the descriptor.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.address.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "connection address cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Username/password pair for the remote service.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
