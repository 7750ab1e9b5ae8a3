//! # Courier Identity
//!
//! Transport-layer identity for Courier nodes.
//!
//! Every node carries two identities: the long-lived business address used
//! inside the state-channel protocol (owned by the caller, opaque to this
//! crate) and the ephemeral transport identity defined here. The transport
//! identity is an Ed25519 keypair; the [`NetworkId`] is the verifying key
//! itself, so any record that embeds an identifier also embeds the key
//! needed to check signatures made with the corresponding signing key.
//!
//! The identifier is regenerated deterministically from the key on every
//! start and is never persisted.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod keypair;

pub use error::IdentityError;
pub use keypair::{Identity, NetworkId, Signature, verify};

/// Length of a network identifier in bytes (an Ed25519 verifying key).
pub const NETWORK_ID_SIZE: usize = 32;

/// Length of a detached signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Length of a signing-key seed in bytes.
pub const SEED_SIZE: usize = 32;
