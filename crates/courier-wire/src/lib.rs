//! # Courier Wire
//!
//! Wire formats for the Courier peer-to-peer layer.
//!
//! Two record types cross the network, each over its own dedicated channel:
//! - [`PeerExchangeMessage`]: the handshake that exchanges (business
//!   address, network identifier) bindings when two nodes connect.
//! - [`Envelope`]: an opaque caller payload addressed to a business
//!   address.
//!
//! Both are serialized as single-line JSON and framed with a one-byte
//! delimiter (`\n`). JSON escapes control characters and the payload bytes
//! travel base64-encoded, so the delimiter can never appear inside a
//! serialized record.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod error;
pub mod framing;
pub mod message;

pub use address::BusinessAddress;
pub use error::WireError;
pub use framing::{DELIMITER, MAX_FRAME_LEN, read_frame, write_frame};
pub use message::{Envelope, PeerExchangeMessage};
