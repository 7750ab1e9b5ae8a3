//! The two record types Courier puts on the wire.

use crate::{BusinessAddress, WireError};
use base64::engine::general_purpose::STANDARD as BASE64;
use courier_identity::NetworkId;
use serde::{Deserialize, Serialize};

/// Handshake record exchanged whenever two nodes connect.
///
/// Carries the sender's (network identifier, business address) binding.
/// `expect_response` marks a handshake that must be answered in kind; it is
/// set only on boot-peer handshakes so ordinary discovered connections do
/// not amplify into handshake ping-pong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerExchangeMessage {
    /// Sender's transport identifier
    pub network_id: NetworkId,
    /// Sender's business address
    pub address: BusinessAddress,
    /// Whether the receiver must reply with its own binding
    pub expect_response: bool,
}

impl PeerExchangeMessage {
    /// Serialize to the single-line JSON record used on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Codec`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from a wire record.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Codec`] on malformed input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// An opaque caller payload addressed to a business address.
///
/// The payload is whatever the state-channel engine wants delivered;
/// Courier never inspects it. On the wire the bytes travel base64-encoded
/// inside the JSON record, which keeps the frame delimiter-safe no matter
/// what the payload contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Destination business address
    pub to: BusinessAddress,
    /// Opaque payload bytes
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Build an envelope for `to` carrying `payload`.
    #[must_use]
    pub fn new(to: BusinessAddress, payload: Vec<u8>) -> Self {
        Self { to, payload }
    }

    /// Serialize to the single-line JSON record used on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Codec`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from a wire record.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Codec`] on malformed input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

mod base64_bytes {
    use super::BASE64;
    use base64::Engine as _;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(D::Error::custom)
    }
}
