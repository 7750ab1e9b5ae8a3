//! Service error taxonomy.
//!
//! Four families: fatal startup errors (bad key material, transport open
//! failure: abort, no retry), transient network errors (retried up to a
//! budget, then surfaced as a delivery failure), malformed-input errors
//! (logged, channel dropped, handler keeps running), and resolution errors
//! (destination unknown, distinct from delivery failure so callers can
//! tell "peer unknown" from "peer known but unreachable").

use courier_directory::{RecordError, StoreError};
use courier_identity::{IdentityError, NetworkId};
use courier_wire::{BusinessAddress, WireError};
use thiserror::Error;

/// Errors surfaced by the external transport host.
#[derive(Debug, Error)]
pub enum HostError {
    /// I/O error on the underlying transport
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Host has been closed
    #[error("transport host is closed")]
    Closed,

    /// Listen address could not be bound
    #[error("failed to open transport listener: {0}")]
    ListenFailed(String),

    /// Dialing a peer multiaddress failed
    #[error("dial failed for {address}: {reason}")]
    DialFailed {
        /// The multiaddress that was dialed
        address: String,
        /// Why the dial failed
        reason: String,
    },

    /// No route to the given peer identifier
    #[error("peer {0} is unreachable")]
    Unreachable(NetworkId),

    /// Malformed peer multiaddress
    #[error("invalid peer address: {0}")]
    InvalidAddress(String),
}

/// Errors returned by [`MessageService`](crate::MessageService) operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad transport key material (fatal at startup)
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Transport host failure
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Wire encoding or framing failure
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Lookup record handling failure
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Record store failure outside the resolution path
    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// Destination absent from both the directory and the record store
    #[error("could not resolve {to} to a network identifier")]
    Unresolved {
        /// The destination that failed to resolve
        to: BusinessAddress,
        /// The underlying store failure
        #[source]
        source: StoreError,
    },

    /// Retry budget exhausted without a successful delivery
    #[error("could not deliver to {to} after {attempts} attempts")]
    Undeliverable {
        /// The resolved but unreachable destination
        to: BusinessAddress,
        /// How many channel opens were attempted
        attempts: usize,
    },

    /// Boot-peer quorum did not form within the configured timeout
    #[error("boot peer quorum not reached: {connected} of {expected} connected")]
    QuorumTimeout {
        /// Peers connected when the timeout fired
        connected: usize,
        /// Boot peers configured
        expected: usize,
    },

    /// Operation on a closed service
    #[error("message service is closed")]
    Closed,
}

impl ServiceError {
    /// Whether this error means the destination could not be resolved, as
    /// opposed to resolved but undeliverable.
    #[must_use]
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }
}
