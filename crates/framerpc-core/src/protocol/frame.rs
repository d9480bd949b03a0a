//! Frame length prefix (panic-free).
//!
//! Every message on the wire is preceded by its byte length encoded as a
//! msgpack unsigned integer. Writers pick the smallest encoding; readers
//! accept positive fixint, uint8, uint16, uint32 and uint64.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Result, RpcError};

const MARKER_U8: u8 = 0xcc;
const MARKER_U16: u8 = 0xcd;
const MARKER_U32: u8 = 0xce;
const MARKER_U64: u8 = 0xcf;

/// Parse the length prefix at the start of `buf`.
///
/// Returns `Ok(None)` until the whole prefix is buffered, otherwise
/// `(prefix_len, payload_len)`.
pub fn peek_frame_len(buf: &[u8]) -> Result<Option<(usize, u64)>> {
    let Some(&marker) = buf.first() else {
        return Ok(None);
    };

    let width = match marker {
        0x00..=0x7f => return Ok(Some((1, u64::from(marker)))),
        MARKER_U8 => 1,
        MARKER_U16 => 2,
        MARKER_U32 => 4,
        MARKER_U64 => 8,
        other => {
            return Err(RpcError::Protocol(format!(
                "invalid frame length marker 0x{other:02x}"
            )))
        }
    };

    let Some(mut digits) = buf.get(1..1 + width) else {
        return Ok(None);
    };
    let len = digits.get_uint(width);
    Ok(Some((1 + width, len)))
}

/// Split one complete frame payload off the front of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed. Frames longer than
/// `max_frame_bytes` are rejected before their payload is buffered.
pub fn decode_frame(buf: &mut BytesMut, max_frame_bytes: usize) -> Result<Option<Bytes>> {
    let Some((prefix_len, payload_len)) = peek_frame_len(buf)? else {
        return Ok(None);
    };

    if payload_len > max_frame_bytes as u64 {
        tracing::debug!(payload_len, max_frame_bytes, "rejecting oversized frame");
        return Err(RpcError::FrameTooLarge {
            len: payload_len,
            max: max_frame_bytes,
        });
    }

    // bounded by max_frame_bytes above
    let payload_len = payload_len as usize;
    if buf.remaining() < prefix_len + payload_len {
        buf.reserve(prefix_len + payload_len - buf.remaining());
        return Ok(None);
    }

    buf.advance(prefix_len);
    Ok(Some(buf.split_to(payload_len).freeze()))
}

/// Prepend the length prefix to `payload`.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    rmp::encode::write_uint(&mut out, payload.len() as u64)
        .map_err(|e| RpcError::Internal(format!("length prefix encode failed: {e}")))?;
    out.extend_from_slice(payload);
    Ok(out)
}
