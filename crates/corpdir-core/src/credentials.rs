//! Service-account bind credentials.
//!
//! A privileged bind identity used for lookups, distinct from the end user
//! being authenticated. The password is held as a [`SecretString`] so it is
//! redacted from debug output and never serialized.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Credentials for the read-only service account used for directory lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCredentials {
    /// Distinguished name the service account binds as.
    pub bind_dn: String,

    /// Service account password.
    #[serde(skip_serializing)]
    bind_password: SecretString,
}

impl ServiceCredentials {
    /// Creates new service-account credentials.
    #[must_use]
    pub fn new(bind_dn: impl Into<String>, bind_password: impl Into<String>) -> Self {
        Self {
            bind_dn: bind_dn.into(),
            bind_password: SecretString::from(bind_password.into()),
        }
    }

    /// Returns the bind DN.
    #[must_use]
    pub fn bind_dn(&self) -> &str {
        &self.bind_dn
    }

    /// Exposes the bind password for the bind call site.
    #[must_use]
    pub fn bind_password(&self) -> &str {
        self.bind_password.expose_secret()
    }
}
