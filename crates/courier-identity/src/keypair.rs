//! Ed25519 transport keypair and the network identifier derived from it.
//!
//! The signing key authenticates directory records published to the
//! distributed table; the verifying key doubles as the node's network
//! identifier. Signing is deterministic, keys are zeroized on drop.

use crate::{IdentityError, NETWORK_ID_SIZE, SEED_SIZE, SIGNATURE_SIZE};
use ed25519_dalek::{Signer, Verifier};
use rand_core::{CryptoRng, RngCore};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::ZeroizeOnDrop;

/// Transport-layer network identifier.
///
/// This is the raw Ed25519 verifying key of the node's transport keypair.
/// It is stable for the process lifetime, regenerated from the key on every
/// start, and used as the destination for channel operations. Carrying the
/// key itself (rather than a hash of it) lets directory records be verified
/// against nothing but the identifier they embed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetworkId([u8; NETWORK_ID_SIZE]);

impl NetworkId {
    /// Create an identifier from raw bytes.
    ///
    /// The bytes are not checked for being a valid curve point here;
    /// [`verify`] reports `false` for identifiers that never were keys.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; NETWORK_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw identifier bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; NETWORK_ID_SIZE] {
        &self.0
    }

    /// Short fingerprint for log lines: the first eight hex characters of
    /// the BLAKE3 hash of the identifier.
    #[must_use]
    pub fn short(&self) -> String {
        let digest = blake3::hash(&self.0);
        hex::encode(&digest.as_bytes()[..4])
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId({})", self.short())
    }
}

impl FromStr for NetworkId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s).map_err(|e| IdentityError::MalformedEncoding(e.to_string()))?;
        if raw.len() != NETWORK_ID_SIZE {
            return Err(IdentityError::InvalidNetworkId);
        }
        let mut bytes = [0u8; NETWORK_ID_SIZE];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

impl Serialize for NetworkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NetworkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Detached Ed25519 signature (64 bytes), hex-encoded on the wire.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Create a signature from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a signature from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidSignature`] if the slice is not
    /// exactly 64 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, IdentityError> {
        if slice.len() != SIGNATURE_SIZE {
            return Err(IdentityError::InvalidSignature);
        }
        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Get the raw signature bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    fn to_dalek(self) -> ed25519_dalek::Signature {
        ed25519_dalek::Signature::from_bytes(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..4]))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(&s).map_err(D::Error::custom)?;
        Self::from_slice(&raw).map_err(D::Error::custom)
    }
}

/// The node's transport identity.
///
/// Owns the Ed25519 signing key exclusively. The key material is zeroized
/// on drop.
#[derive(ZeroizeOnDrop)]
pub struct Identity {
    inner: ed25519_dalek::SigningKey,
}

impl Identity {
    /// Generate a fresh random identity.
    #[must_use]
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::generate(rng),
        }
    }

    /// Load an identity from a 32-byte seed supplied by the operator.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidSeedLength`] if the seed is not
    /// exactly 32 bytes. Bad key material is a fatal startup error for the
    /// service; there is no fallback identity.
    pub fn from_seed(seed: &[u8]) -> Result<Self, IdentityError> {
        if seed.len() != SEED_SIZE {
            return Err(IdentityError::InvalidSeedLength {
                expected: SEED_SIZE,
                actual: seed.len(),
            });
        }
        let mut bytes = [0u8; SEED_SIZE];
        bytes.copy_from_slice(seed);
        Ok(Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&bytes),
        })
    }

    /// The network identifier derived from this keypair.
    #[must_use]
    pub fn network_id(&self) -> NetworkId {
        NetworkId(self.inner.verifying_key().to_bytes())
    }

    /// Sign a message with the transport key.
    ///
    /// Deterministic: the same message always produces the same signature
    /// with the same key.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.inner.sign(message).to_bytes())
    }

    /// Export the seed bytes (use with extreme caution).
    ///
    /// # Security
    ///
    /// This exposes the raw secret key bytes. Handle with care and ensure
    /// proper zeroization after use.
    #[must_use]
    pub fn to_seed_bytes(&self) -> [u8; SEED_SIZE] {
        self.inner.to_bytes()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("network_id", &self.network_id())
            .finish()
    }
}

/// Verify a detached signature against a network identifier.
///
/// Returns `false` for invalid signatures and for identifiers that do not
/// decode to a valid verifying key. Never panics on malformed input; this
/// is the primitive the record validator builds on.
#[must_use]
pub fn verify(id: &NetworkId, message: &[u8], signature: &Signature) -> bool {
    let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(id.as_bytes()) else {
        return false;
    };
    key.verify(message, &signature.to_dalek()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn network_id_stable_across_reload() {
        let identity = Identity::generate(&mut OsRng);
        let seed = identity.to_seed_bytes();
        let reloaded = Identity::from_seed(&seed).unwrap();

        assert_eq!(identity.network_id(), reloaded.network_id());
    }

    #[test]
    fn from_seed_rejects_wrong_length() {
        assert!(matches!(
            Identity::from_seed(&[0u8; 16]),
            Err(IdentityError::InvalidSeedLength {
                expected: 32,
                actual: 16
            })
        ));
        assert!(Identity::from_seed(&[0u8; 64]).is_err());
    }

    #[test]
    fn sign_verify_roundtrip() {
        let identity = Identity::generate(&mut OsRng);
        let message = b"directory record payload";
        let signature = identity.sign(message);

        assert!(verify(&identity.network_id(), message, &signature));
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let identity = Identity::generate(&mut OsRng);
        let signature = identity.sign(b"original");

        assert!(!verify(&identity.network_id(), b"tampered", &signature));
    }

    #[test]
    fn verify_rejects_foreign_key() {
        let signer = Identity::generate(&mut OsRng);
        let other = Identity::generate(&mut OsRng);
        let signature = signer.sign(b"message");

        assert!(!verify(&other.network_id(), b"message", &signature));
    }

    #[test]
    fn verify_rejects_flipped_signature_bit() {
        let identity = Identity::generate(&mut OsRng);
        let signature = identity.sign(b"message");

        let mut tampered = *signature.as_bytes();
        tampered[0] ^= 0x01;
        let tampered = Signature::from_bytes(tampered);

        assert!(!verify(&identity.network_id(), b"message", &tampered));
    }

    #[test]
    fn verify_handles_non_key_identifier() {
        // Not every 32-byte string is a curve point; verification must
        // report false rather than panic.
        let identity = Identity::generate(&mut OsRng);
        let signature = identity.sign(b"message");
        let bogus = NetworkId::from_bytes([0xFF; 32]);

        assert!(!verify(&bogus, b"message", &signature));
    }

    #[test]
    fn network_id_display_parse_roundtrip() {
        let id = Identity::generate(&mut OsRng).network_id();
        let parsed: NetworkId = id.to_string().parse().unwrap();

        assert_eq!(id, parsed);
    }

    #[test]
    fn network_id_parse_rejects_bad_input() {
        assert!("zz".parse::<NetworkId>().is_err());
        assert!("abcd".parse::<NetworkId>().is_err()); // too short
    }

    #[test]
    fn network_id_serde_roundtrip() {
        let id = Identity::generate(&mut OsRng).network_id();
        let json = serde_json::to_string(&id).unwrap();
        let back: NetworkId = serde_json::from_str(&json).unwrap();

        assert_eq!(id, back);
        assert!(json.contains(&id.to_string()));
    }

    #[test]
    fn signature_serde_roundtrip() {
        let identity = Identity::generate(&mut OsRng);
        let signature = identity.sign(b"payload");

        let json = serde_json::to_string(&signature).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();

        assert_eq!(signature, back);
    }

    #[test]
    fn signature_from_slice_wrong_size() {
        assert!(Signature::from_slice(&[0u8; 32]).is_err());
        assert!(Signature::from_slice(&[0u8; 128]).is_err());
    }

    #[test]
    fn short_fingerprint_is_eight_hex_chars() {
        let id = Identity::generate(&mut OsRng).network_id();
        let short = id.short();

        assert_eq!(short.len(), 8);
        assert!(short.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
