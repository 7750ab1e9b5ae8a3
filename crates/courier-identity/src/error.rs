//! Identity error types.

use thiserror::Error;

/// Errors produced while handling transport key material.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Seed bytes have the wrong length
    #[error("invalid seed length: expected {expected}, got {actual}")]
    InvalidSeedLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Bytes do not encode a valid Ed25519 verifying key
    #[error("invalid network identifier")]
    InvalidNetworkId,

    /// Signature bytes have the wrong length or shape
    #[error("invalid signature")]
    InvalidSignature,

    /// Hex decoding of an identifier failed
    #[error("malformed identifier encoding: {0}")]
    MalformedEncoding(String),
}
