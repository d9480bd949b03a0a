//! Frame reader: splits the inbound byte stream into message payloads.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use framerpc_core::error::{Result, RpcError};
use framerpc_core::protocol::frame::decode_frame;

const READ_CHUNK: usize = 8 * 1024;

/// Single-owner reader; never shared between tasks.
pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
    max_frame_bytes: usize,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(inner: R, max_frame_bytes: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK),
            max_frame_bytes,
        }
    }

    /// Next complete frame, or `None` on clean EOF between frames.
    pub async fn next_frame(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.max_frame_bytes)? {
                return Ok(Some(frame));
            }

            self.buf.reserve(READ_CHUNK);
            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(RpcError::Protocol(format!(
                    "connection closed mid-frame ({} bytes buffered)",
                    self.buf.len()
                )));
            }
        }
    }
}
