//! Request variants and the serve protocol.
//!
//! Flow for one inbound message:
//! 1. `new_request(kind)` builds the variant for the call-kind tag.
//! 2. `decode` fills the header slots (seqno/method) on the reading context.
//! 3. `serve` decodes the argument (Call/Notify), then spawns the handler run.
//!    Cancel only logs and returns.
//! 4. Calls write `[Response, seqno, err, res]` when the handler finishes.

mod call;
mod cancel;
mod notify;
mod serve;

use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinHandle;

use framerpc_core::error::Result;
use framerpc_core::protocol::{decode_into, Decoder, Message, MessageKind};
use framerpc_core::{DecodeError, RpcError, Value};

use crate::handler::ServeHandlerDescription;
use crate::obs::RpcLog;
use crate::transport::Transmitter;

pub use call::CallRequest;
pub use cancel::CancelRequest;
pub use notify::NotifyRequest;
pub use serve::ServeContext;

/// One inbound request, exclusively owned by the dispatch that built it.
#[derive(Debug, Clone)]
pub enum Request {
    Call(CallRequest),
    Notify(NotifyRequest),
    Cancel(CancelRequest),
}

/// Map a call-kind tag to its request variant. `Response` has none.
pub fn new_request(kind: MessageKind) -> Option<Request> {
    match kind {
        MessageKind::Call => Some(Request::Call(CallRequest::new())),
        MessageKind::Notify => Some(Request::Notify(NotifyRequest::new())),
        MessageKind::Cancel => Some(Request::Cancel(CancelRequest::new())),
        MessageKind::Response => None,
    }
}

impl Request {
    pub fn kind(&self) -> MessageKind {
        match self {
            Request::Call(_) => MessageKind::Call,
            Request::Notify(_) => MessageKind::Notify,
            Request::Cancel(_) => MessageKind::Cancel,
        }
    }

    pub fn message(&self) -> &Message {
        match self {
            Request::Call(r) => &r.msg,
            Request::Notify(r) => &r.msg,
            Request::Cancel(r) => &r.msg,
        }
    }

    pub fn message_mut(&mut self) -> &mut Message {
        match self {
            Request::Call(r) => &mut r.msg,
            Request::Notify(r) => &mut r.msg,
            Request::Cancel(r) => &mut r.msg,
        }
    }

    pub fn method(&self) -> &str {
        &self.message().method
    }

    /// Whether the variant decodes an argument and runs a handler.
    pub fn invokes_handler(&self) -> bool {
        !matches!(self, Request::Cancel(_))
    }

    /// Decode the declared header slots in order.
    pub fn decode(&mut self, dec: &mut dyn Decoder) -> std::result::Result<(), DecodeError> {
        decode_into(self.message_mut(), dec)
    }

    pub fn log_invocation(&self, log: &dyn RpcLog, err: Option<&RpcError>, arg: Option<&Value>) {
        match self {
            Request::Call(r) => r.log_invocation(log, err, arg),
            Request::Notify(r) => r.log_invocation(log, err, arg),
            Request::Cancel(r) => r.log_invocation(log, err, arg),
        }
    }

    pub fn log_completion(&self, log: &dyn RpcLog, err: Option<&Value>) {
        match self {
            Request::Call(r) => r.log_completion(log, err),
            Request::Notify(r) => r.log_completion(log, err),
            Request::Cancel(r) => r.log_completion(log, err),
        }
    }

    pub async fn reply(&self, tx: &dyn Transmitter, log: &dyn RpcLog) -> Result<()> {
        match self {
            Request::Call(r) => r.reply(tx, log).await,
            Request::Notify(r) => r.reply(tx, log).await,
            Request::Cancel(r) => r.reply(tx, log).await,
        }
    }

    /// Decode the argument if the variant takes one, then dispatch.
    ///
    /// Returns the execution unit for Call/Notify; Cancel finishes inline
    /// and returns `None`. `admission` is held while the handler runs.
    pub fn serve(
        self,
        dec: &mut dyn Decoder,
        handler: &ServeHandlerDescription,
        ctx: &ServeContext,
        admission: Option<OwnedSemaphorePermit>,
    ) -> Option<JoinHandle<()>> {
        match self {
            Request::Call(r) => Some(r.serve(dec, handler, ctx, admission)),
            Request::Notify(r) => Some(r.serve(dec, handler, ctx, admission)),
            Request::Cancel(r) => {
                r.serve(ctx.log.as_ref());
                None
            }
        }
    }
}
