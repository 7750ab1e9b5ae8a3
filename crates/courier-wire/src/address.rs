//! Business address: the long-term identity used by the state-channel
//! protocol to name a node.
//!
//! Courier treats the address as an opaque, case-sensitive string. It is
//! assigned externally, immutable once assigned, and distinct from the
//! transport-layer [`NetworkId`](courier_identity::NetworkId) it maps to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque long-term protocol identity of a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessAddress(String);

impl BusinessAddress {
    /// Wrap an externally supplied address string.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusinessAddress {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for BusinessAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}
