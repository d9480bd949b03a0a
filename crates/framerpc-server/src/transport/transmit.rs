//! Shared reply transmitter.
//!
//! Replies from concurrently completing calls all go through one
//! `Transmitter`. Implementations must serialize writers: a frame is written
//! and flushed in full before the next one starts.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use framerpc_core::error::{Result, RpcError};
use framerpc_core::protocol::frame::encode_frame;
use framerpc_core::protocol::Reply;

#[async_trait]
pub trait Transmitter: Send + Sync {
    async fn encode(&self, reply: &Reply) -> Result<()>;
}

/// Length-prefixed msgpack writer guarded by a mutex.
pub struct FramedTransmitter<W> {
    sink: Mutex<W>,
}

impl<W> FramedTransmitter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Flush and shut down the underlying sink.
    pub async fn shutdown(&self) -> Result<()> {
        let mut sink = self.sink.lock().await;
        sink.shutdown().await.map_err(RpcError::Transmission)
    }
}

#[async_trait]
impl<W> Transmitter for FramedTransmitter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn encode(&self, reply: &Reply) -> Result<()> {
        // encode outside the lock; only the write is serialized
        let frame = encode_frame(&reply.encode()?)?;
        let mut sink = self.sink.lock().await;
        sink.write_all(&frame).await.map_err(RpcError::Transmission)?;
        sink.flush().await.map_err(RpcError::Transmission)
    }
}
