//! Directory and record-store error types.

use thiserror::Error;

/// Errors produced while validating or selecting lookup records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// JSON encoding or decoding of a record failed
    #[error("record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Signature does not verify against the embedded identifier
    #[error("record signature does not verify against embedded identifier")]
    BadSignature,

    /// Select was called with no candidates
    #[error("no candidate records to select from")]
    NoCandidates,

    /// Select found no structurally and cryptographically valid candidate
    #[error("no valid candidate record")]
    NoValidCandidate,
}

/// Errors produced by the distributed record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists under the requested key
    #[error("no record found for key {key}")]
    NotFound {
        /// The namespaced key that was looked up
        key: String,
    },

    /// Key does not live under the store's reserved namespace
    #[error("key {key} is outside the reserved namespace")]
    WrongNamespace {
        /// The offending key
        key: String,
    },

    /// The record failed validation
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordError),

    /// The table is unreachable (network partition, shutdown)
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}
