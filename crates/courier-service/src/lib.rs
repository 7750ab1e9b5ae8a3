//! # Courier Service
//!
//! The Courier message service: peer discovery and reliable delivery of
//! opaque payloads between state-channel nodes.
//!
//! This crate provides:
//! - The [`Host`] and [`LocalDiscovery`] seams to the external transport
//!   host and broadcast-discovery collaborators.
//! - The peer exchange handshake that populates the shared
//!   [`Directory`](courier_directory::Directory) whenever two nodes
//!   connect.
//! - [`MessageService::send`]: framed delivery with directory resolution,
//!   record-store fallback, and bounded fixed-backoff retry.
//! - The bootstrap controller ordering startup so no inbound channel can
//!   arrive before its handler exists, including the Global strategy's
//!   boot-peer quorum wait.
//!
//! ## Startup ordering
//!
//! ```text
//! Uninitialized → IdentityLoaded → TransportOpen → HandlersInstalled
//!              → DiscoveryRunning → (Global w/ boot peers: QuorumReached)
//!              → Ready
//! ```
//!
//! Any failure before `Ready` aborts startup; per-connection and
//! per-message failures after that are isolated and recoverable.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod host;
pub mod service;

pub use config::ServiceConfig;
pub use discovery::{DiscoveryStrategy, LocalDiscovery, PeerFoundHandler};
pub use error::{HostError, ServiceError};
pub use host::{Channel, ChannelHandler, ChannelStream, ConnectionEvent, Host, ProtocolTag};
pub use service::{
    MESSAGE_PROTOCOL, MessageService, PEER_EXCHANGE_PROTOCOL, PeerRecord, ServiceMailboxes,
    ServicePhase,
};
