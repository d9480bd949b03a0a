//! Shared pieces of the serve protocol.
//!
//! Decoding always happens on the reading context before anything is
//! spawned. Only the handler run (and, for calls, the reply write) moves to
//! the execution unit, so slow handlers never hold up the next read.

use std::sync::Arc;

use framerpc_core::{DecodeError, HandlerError, RpcError, Value};

use crate::handler::Invocation;
use crate::obs::RpcLog;
use crate::transport::Transmitter;
use crate::wrap::WrapErrorFn;

/// Collaborators every served request reports through.
#[derive(Clone)]
pub struct ServeContext {
    pub transmitter: Arc<dyn Transmitter>,
    pub wrap: Option<WrapErrorFn>,
    pub log: Arc<dyn RpcLog>,
}

impl ServeContext {
    pub fn new(transmitter: Arc<dyn Transmitter>, log: Arc<dyn RpcLog>) -> Self {
        Self {
            transmitter,
            wrap: None,
            log,
        }
    }

    pub fn with_wrap(mut self, wrap: WrapErrorFn) -> Self {
        self.wrap = Some(wrap);
        self
    }
}

/// Run a decoded invocation on the blocking pool.
///
/// A decode failure short-circuits: the handler is never called.
pub(crate) async fn run_invocation(
    invocation: Result<Invocation, DecodeError>,
) -> Result<Value, RpcError> {
    let invocation = invocation?;
    match tokio::task::spawn_blocking(move || invocation.run()).await {
        Ok(res) => res.map_err(RpcError::from),
        Err(e) if e.is_panic() => Err(HandlerError::Panicked.into()),
        Err(e) => Err(RpcError::Internal(format!("handler task failed: {e}"))),
    }
}

/// Turn the decode half of a `DecodedArg` into the error logged at invocation.
pub(crate) fn decode_failure(invocation: &Result<Invocation, DecodeError>) -> Option<RpcError> {
    invocation.as_ref().err().map(|e| RpcError::Decode(e.clone()))
}
