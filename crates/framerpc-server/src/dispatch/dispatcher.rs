use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use framerpc_core::error::{Result, RpcError};
use framerpc_core::protocol::{Decoder, MessageKind, MsgPackDecoder};

use crate::handler::HandlerRegistry;
use crate::obs::{RpcLog, ServerMetrics};
use crate::request::{new_request, ServeContext};
use crate::transport::{FrameReader, FramedTransmitter};
use crate::wrap::WrapErrorFn;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1024;

/// Turns inbound frames into served requests.
///
/// One dispatcher is shared by every connection; the admission semaphore
/// therefore bounds in-flight calls and notifications server-wide.
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    log: Arc<dyn RpcLog>,
    wrap: Option<WrapErrorFn>,
    admission: Arc<Semaphore>,
    max_in_flight: usize,
    max_frame_bytes: usize,
    metrics: Option<Arc<ServerMetrics>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>, log: Arc<dyn RpcLog>) -> Self {
        Self {
            registry,
            log,
            wrap: None,
            admission: Arc::new(Semaphore::new(DEFAULT_MAX_IN_FLIGHT)),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            metrics: None,
        }
    }

    pub fn with_wrap(mut self, wrap: WrapErrorFn) -> Self {
        self.wrap = Some(wrap);
        self
    }

    pub fn with_limits(mut self, max_in_flight: usize, max_frame_bytes: usize) -> Self {
        self.admission = Arc::new(Semaphore::new(max_in_flight));
        self.max_in_flight = max_in_flight;
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ServerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Calls/notifications currently holding an admission permit.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight
            .saturating_sub(self.admission.available_permits())
    }

    /// Serve context for a connection writing replies through `transmitter`.
    pub fn context(&self, transmitter: Arc<dyn crate::transport::Transmitter>) -> ServeContext {
        ServeContext {
            transmitter,
            wrap: self.wrap.clone(),
            log: Arc::clone(&self.log),
        }
    }

    /// Dispatch one message.
    ///
    /// Everything up to and including the argument decode happens before
    /// this returns; the handler runs on the returned unit (Call/Notify).
    /// Errors here mean no request could be formed for the message.
    pub async fn dispatch_frame(
        &self,
        frame: Bytes,
        ctx: &ServeContext,
    ) -> Result<Option<JoinHandle<()>>> {
        let mut dec = MsgPackDecoder::new(frame);

        let n_fields = dec.read_array_len()? as usize;
        if n_fields == 0 {
            return Err(RpcError::Protocol("empty message".into()));
        }

        let tag = dec.decode_value()?;
        let tag = tag
            .as_i64()
            .ok_or_else(|| RpcError::Protocol(format!("message kind is not an integer: {tag}")))?;
        let kind = MessageKind::from_wire(tag).ok_or(RpcError::UnknownKind(tag))?;
        let mut req = new_request(kind).ok_or(RpcError::UnknownKind(tag))?;

        req.message_mut().envelope.limit_to(n_fields - 1);
        req.decode(&mut dec)?;

        let handler = self.registry.lookup(req.method());
        let admission = if req.invokes_handler() {
            let permit = Arc::clone(&self.admission)
                .acquire_owned()
                .await
                .map_err(|_| RpcError::Internal("admission semaphore closed".into()))?;
            Some(permit)
        } else {
            None
        };

        Ok(req.serve(&mut dec, &handler, ctx, admission))
    }

    /// Read frames from `reader` until EOF, serving each one in order.
    ///
    /// Message-level failures are logged and skipped; frame-level failures
    /// end the connection. In-flight units are awaited before returning so
    /// their replies reach the peer.
    pub async fn serve_connection<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        if let Some(m) = &self.metrics {
            m.connections.inc(&[]);
        }

        let transmitter = Arc::new(FramedTransmitter::new(writer));
        let ctx = self.context(transmitter.clone());
        let mut frames = FrameReader::new(reader, self.max_frame_bytes);
        let mut in_flight: FuturesUnordered<JoinHandle<()>> = FuturesUnordered::new();

        let outcome = loop {
            while let Some(Some(done)) = in_flight.next().now_or_never() {
                if let Err(e) = done {
                    tracing::error!(error = %e, "serve task failed");
                }
            }

            let frame = match frames.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            };

            match self.dispatch_frame(frame, &ctx).await {
                Ok(Some(unit)) => in_flight.push(unit),
                Ok(None) => {}
                Err(e) => {
                    if let Some(m) = &self.metrics {
                        m.protocol_errors.inc(&[("code", e.code().as_str())]);
                    }
                    self.log.warning(&format!("dropping message: {e}"));
                }
            }
        };

        while let Some(done) = in_flight.next().await {
            if let Err(e) = done {
                tracing::error!(error = %e, "serve task failed");
            }
        }

        if let Err(e) = transmitter.shutdown().await {
            tracing::debug!(error = %e, "transmitter shutdown failed");
        }

        outcome
    }
}
