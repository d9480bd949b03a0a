use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinHandle;

use framerpc_core::error::Result;
use framerpc_core::protocol::envelope::method_slot;
use framerpc_core::protocol::{Decoder, DecodeSlot, Envelope, Message};
use framerpc_core::{RpcError, Value};

use super::serve::{decode_failure, run_invocation, ServeContext};
use crate::handler::ServeHandlerDescription;
use crate::obs::RpcLog;
use crate::transport::Transmitter;
use crate::wrap::wrap_error;

/// `[method, arg]`
const NOTIFY_FIELDS: usize = 2;
static NOTIFY_SLOTS: [DecodeSlot; 1] = [method_slot];

/// Fire-and-forget request: runs the handler, never replies.
#[derive(Debug, Clone)]
pub struct NotifyRequest {
    pub(crate) msg: Message,
}

impl NotifyRequest {
    pub fn new() -> Self {
        Self {
            msg: Message::new(Envelope::new(NOTIFY_FIELDS, &NOTIFY_SLOTS)),
        }
    }

    pub fn method(&self) -> &str {
        &self.msg.method
    }

    pub fn log_invocation(&self, log: &dyn RpcLog, err: Option<&RpcError>, arg: Option<&Value>) {
        log.server_notify_call(&self.msg.method, err, arg);
    }

    pub fn log_completion(&self, log: &dyn RpcLog, err: Option<&Value>) {
        log.server_notify_complete(&self.msg.method, err);
    }

    /// Notifications have no reply.
    pub async fn reply(&self, _tx: &dyn Transmitter, _log: &dyn RpcLog) -> Result<()> {
        Ok(())
    }

    pub fn serve(
        mut self,
        dec: &mut dyn Decoder,
        handler: &ServeHandlerDescription,
        ctx: &ServeContext,
        admission: Option<OwnedSemaphorePermit>,
    ) -> JoinHandle<()> {
        let prof = ctx.log.start_profiler(format!("serve-notify {}", self.msg.method));
        let decoded = handler.get_arg(dec, &mut self.msg.envelope);
        let ctx = ctx.clone();

        tokio::spawn(async move {
            let _admission = admission;
            let decode_err = decode_failure(&decoded.invocation);
            self.log_invocation(ctx.log.as_ref(), decode_err.as_ref(), decoded.raw.as_ref());

            let err = run_invocation(decoded.invocation)
                .await
                .err()
                .and_then(|e| wrap_error(ctx.wrap.as_ref(), Some(&e)));

            prof.stop();
            self.log_completion(ctx.log.as_ref(), err.as_ref());
        })
    }
}

impl Default for NotifyRequest {
    fn default() -> Self {
        Self::new()
    }
}
