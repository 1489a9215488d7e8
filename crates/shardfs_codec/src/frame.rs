//! Length-prefixed framing.
//!
//! A frame is a 4-byte little-endian payload length followed by the
//! payload, so readers find record boundaries without scanning.

use crate::error::{CodecError, CodecResult};

/// Size of the frame length prefix in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Appends `payload` to `out` as one frame.
///
/// # Errors
///
/// Returns an error if the payload is longer than `u32::MAX` bytes.
pub fn encode_frame(payload: &[u8], out: &mut Vec<u8>) -> CodecResult<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| CodecError::encoding_failed("frame payload exceeds 4 GiB"))?;
    out.reserve(FRAME_HEADER_SIZE + payload.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

/// Reads one frame from the front of `data`.
///
/// Returns the payload and the total number of bytes consumed.
///
/// # Errors
///
/// Returns [`CodecError::UnexpectedEof`] if the header or payload is truncated.
pub fn decode_frame(data: &[u8]) -> CodecResult<(&[u8], usize)> {
    let header = data
        .get(..FRAME_HEADER_SIZE)
        .ok_or(CodecError::UnexpectedEof)?;
    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let end = FRAME_HEADER_SIZE
        .checked_add(len)
        .ok_or(CodecError::UnexpectedEof)?;
    let payload = data
        .get(FRAME_HEADER_SIZE..end)
        .ok_or(CodecError::UnexpectedEof)?;
    Ok((payload, end))
}
