//! Delimiter framing over async byte channels.
//!
//! Each dedicated channel carries exactly one framed record: the serialized
//! bytes followed by a single [`DELIMITER`] byte. Reads are bounded by
//! [`MAX_FRAME_LEN`] so a misbehaving peer cannot grow memory without
//! limit, and a clean end-of-stream before any byte arrives is reported as
//! `Ok(None)` rather than an error; the remote may simply have had
//! nothing to say.

use crate::WireError;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Reserved frame delimiter. Serialized records are single-line JSON, which
/// escapes control characters, so this byte never appears inside a record.
pub const DELIMITER: u8 = b'\n';

/// Maximum serialized record length accepted on the inbound path.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Write one framed record to the channel and flush it.
///
/// # Errors
///
/// Returns [`WireError::DelimiterInRecord`] if the record bytes contain the
/// delimiter (a codec bug, not a peer fault), or [`WireError::Io`] on a
/// write failure.
pub async fn write_frame<W>(writer: &mut W, record: &[u8]) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    if record.contains(&DELIMITER) {
        return Err(WireError::DelimiterInRecord);
    }
    writer.write_all(record).await?;
    writer.write_all(&[DELIMITER]).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed record from the channel.
///
/// Returns `Ok(None)` when the stream is cleanly closed before any byte of
/// a record arrives.
///
/// # Errors
///
/// Returns [`WireError::UnterminatedFrame`] if the stream closes mid-record,
/// [`WireError::FrameTooLong`] if the record exceeds [`MAX_FRAME_LEN`], or
/// [`WireError::Io`] on a read failure.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, WireError>
where
    R: AsyncRead + Unpin,
{
    // Bound the read one byte past the limit so an over-long frame is
    // distinguishable from one that exactly fills it.
    let limited = (&mut *reader).take(MAX_FRAME_LEN as u64 + 1);
    let mut buffered = BufReader::new(limited);

    let mut record = Vec::new();
    let n = buffered.read_until(DELIMITER, &mut record).await?;
    if n == 0 {
        return Ok(None);
    }
    if record.last() != Some(&DELIMITER) {
        if record.len() > MAX_FRAME_LEN {
            return Err(WireError::FrameTooLong {
                limit: MAX_FRAME_LEN,
            });
        }
        return Err(WireError::UnterminatedFrame);
    }
    record.pop();
    if record.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLong {
            limit: MAX_FRAME_LEN,
        });
    }
    Ok(Some(record))
}
