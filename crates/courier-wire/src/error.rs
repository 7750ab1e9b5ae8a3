//! Wire-level error types.

use thiserror::Error;

/// Errors produced while encoding, decoding or framing wire records.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON encoding or decoding failed
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// I/O error on the underlying channel
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream ended before the frame delimiter arrived
    #[error("unterminated frame: stream closed mid-record")]
    UnterminatedFrame,

    /// Frame exceeds the configured maximum length
    #[error("frame exceeds maximum length of {limit} bytes")]
    FrameTooLong {
        /// The enforced limit
        limit: usize,
    },

    /// Serialized record contains the reserved delimiter byte
    #[error("serialized record contains the frame delimiter")]
    DelimiterInRecord,
}
