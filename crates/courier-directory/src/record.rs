//! Signed lookup records and the validator injected into the distributed
//! table.
//!
//! A node publishes a [`SignedRecord`] binding its business address to its
//! current network identifier under the reserved namespace. The record is
//! self-consistent: the signature covers the serialized
//! (address, identifier, timestamp) tuple and verifies against the embedded
//! identifier itself, so validation needs no node-local state and no view
//! of who wrote the record.
//!
//! Conflict resolution between colliding records is last-write-wins on the
//! embedded timestamp, with ties broken by raw byte comparison of the
//! serialized record, the only total order available without a trusted
//! clock.

use crate::RecordError;
use courier_identity::{Identity, NetworkId, Signature};
use courier_wire::BusinessAddress;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Reserved namespace for address lookup records.
pub const RECORD_NAMESPACE: &str = "addr";

/// Namespaced table key for an address, `/addr/<address>`.
#[must_use]
pub fn record_key(address: &BusinessAddress) -> String {
    format!("/{RECORD_NAMESPACE}/{address}")
}

/// The signed portion of a lookup record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordData {
    /// Business address being bound
    pub address: BusinessAddress,
    /// Network identifier currently reachable at that address
    pub network_id: NetworkId,
    /// Publication time, unix seconds
    pub timestamp: u64,
}

impl RecordData {
    /// Canonical signing bytes. Field order is fixed by the struct, so the
    /// same data always serializes to the same bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Codec`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A lookup record as stored in the distributed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRecord {
    /// Signed payload
    pub data: RecordData,
    /// Signature over [`RecordData::to_bytes`], made with the transport key
    /// behind `data.network_id`
    pub signature: Signature,
}

impl SignedRecord {
    /// Build and sign a record binding `address` to this identity at
    /// `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Codec`] if the signing bytes cannot be
    /// produced.
    pub fn seal(
        identity: &Identity,
        address: BusinessAddress,
        timestamp: u64,
    ) -> Result<Self, RecordError> {
        let data = RecordData {
            address,
            network_id: identity.network_id(),
            timestamp,
        };
        let signature = identity.sign(&data.to_bytes()?);
        Ok(Self { data, signature })
    }

    /// [`SignedRecord::seal`] with the current wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Codec`] if the signing bytes cannot be
    /// produced.
    pub fn seal_now(identity: &Identity, address: BusinessAddress) -> Result<Self, RecordError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self::seal(identity, address, timestamp)
    }

    /// Check the record's cryptographic self-consistency.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::BadSignature`] if the signature does not
    /// verify against the embedded identifier.
    pub fn verify(&self) -> Result<(), RecordError> {
        let message = self.data.to_bytes()?;
        if courier_identity::verify(&self.data.network_id, &message, &self.signature) {
            Ok(())
        } else {
            Err(RecordError::BadSignature)
        }
    }

    /// Serialize for storage in the table.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Codec`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize a stored record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Codec`] on malformed input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The identifier this record binds its address to.
    #[must_use]
    pub fn network_id(&self) -> NetworkId {
        self.data.network_id
    }
}

/// Validation and conflict-resolution pair injected into the distributed
/// table at construction time.
///
/// Implementations must be pure with respect to node-local mutable state so
/// they can run inside the table's own conflict resolution and be unit
/// tested in isolation from the network.
pub trait Validator: Send + Sync {
    /// Check that `value` is an acceptable record for `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] describing why the record was rejected.
    fn validate(&self, key: &str, value: &[u8]) -> Result<(), RecordError>;

    /// Choose the best record among colliding candidates for `key`,
    /// returning its index.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NoCandidates`] for an empty slate and
    /// [`RecordError::NoValidCandidate`] when nothing validates.
    fn select(&self, key: &str, candidates: &[Vec<u8>]) -> Result<usize, RecordError>;
}

/// Validator for records under [`RECORD_NAMESPACE`].
///
/// Checks only cryptographic self-consistency; the signature already binds
/// address to identifier, so there is no separate ownership check.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddressRecordValidator;

impl Validator for AddressRecordValidator {
    fn validate(&self, _key: &str, value: &[u8]) -> Result<(), RecordError> {
        SignedRecord::from_bytes(value)?.verify()
    }

    fn select(&self, key: &str, candidates: &[Vec<u8>]) -> Result<usize, RecordError> {
        if candidates.is_empty() {
            return Err(RecordError::NoCandidates);
        }

        let mut best: Option<(usize, u64)> = None;
        for (index, bytes) in candidates.iter().enumerate() {
            if self.validate(key, bytes).is_err() {
                continue;
            }
            let timestamp = SignedRecord::from_bytes(bytes)?.data.timestamp;
            best = match best {
                None => Some((index, timestamp)),
                Some((best_index, best_timestamp)) => {
                    let newer = timestamp > best_timestamp
                        || (timestamp == best_timestamp
                            && bytes.as_slice() > candidates[best_index].as_slice());
                    if newer {
                        Some((index, timestamp))
                    } else {
                        Some((best_index, best_timestamp))
                    }
                }
            };
        }

        best.map(|(index, _)| index)
            .ok_or(RecordError::NoValidCandidate)
    }
}
