//! Sequential msgpack decoder over a single frame (panic-free).
//!
//! Rules:
//! - Never index the frame directly; use `get(..)` and remaining-length checks.
//! - Every read advances the cursor by exactly the bytes consumed, even when
//!   the value fails to decode, so the position stays well-defined.

use bytes::Bytes;

use crate::error::DecodeError;
use crate::Value;

/// Positional decoder contract: one wire value per call, in stream order.
pub trait Decoder {
    /// Read an array header and return its length.
    fn read_array_len(&mut self) -> Result<u32, DecodeError>;

    /// Decode the next positional value.
    fn decode_value(&mut self) -> Result<Value, DecodeError>;
}

/// `Decoder` over an in-memory msgpack frame.
#[derive(Debug, Clone)]
pub struct MsgPackDecoder {
    buf: Bytes,
    pos: usize,
}

impl MsgPackDecoder {
    pub fn new(buf: Bytes) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn read_with<T, E>(&mut self, f: impl FnOnce(&mut &[u8]) -> Result<T, E>) -> Result<T, E> {
        let mut rd: &[u8] = self.buf.get(self.pos..).unwrap_or(&[]);
        let before = rd.len();
        let out = f(&mut rd);
        let consumed = before - rd.len();
        self.pos += consumed;
        out
    }
}

impl Decoder for MsgPackDecoder {
    fn read_array_len(&mut self) -> Result<u32, DecodeError> {
        self.read_with(|rd| {
            rmp::decode::read_array_len(rd).map_err(|e| match e {
                rmp::decode::ValueReadError::TypeMismatch(_) => DecodeError::NotArray,
                other => DecodeError::Malformed(other.to_string()),
            })
        })
    }

    fn decode_value(&mut self) -> Result<Value, DecodeError> {
        self.read_with(|rd| {
            rmpv::decode::read_value(rd).map_err(|e| DecodeError::Malformed(e.to_string()))
        })
    }
}
