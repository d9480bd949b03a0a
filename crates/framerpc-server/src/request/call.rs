use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinHandle;

use framerpc_core::error::Result;
use framerpc_core::protocol::envelope::{method_slot, seqno_slot};
use framerpc_core::protocol::{Decoder, DecodeSlot, Envelope, Message, Reply, SeqNumber};
use framerpc_core::{RpcError, Value};

use super::serve::{decode_failure, run_invocation, ServeContext};
use crate::handler::ServeHandlerDescription;
use crate::obs::RpcLog;
use crate::transport::Transmitter;
use crate::wrap::wrap_error;

/// `[seqno, method, arg]`
const CALL_FIELDS: usize = 3;
static CALL_SLOTS: [DecodeSlot; 2] = [seqno_slot, method_slot];

/// Request expecting a reply. The only variant that carries an outcome.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub(crate) msg: Message,
    err: Option<Value>,
    res: Option<Value>,
}

impl CallRequest {
    pub fn new() -> Self {
        Self {
            msg: Message::new(Envelope::new(CALL_FIELDS, &CALL_SLOTS)),
            err: None,
            res: None,
        }
    }

    pub fn seqno(&self) -> SeqNumber {
        self.msg.seqno
    }

    pub fn method(&self) -> &str {
        &self.msg.method
    }

    pub fn log_invocation(&self, log: &dyn RpcLog, err: Option<&RpcError>, arg: Option<&Value>) {
        log.server_call(self.msg.seqno, &self.msg.method, err, arg);
    }

    pub fn log_completion(&self, log: &dyn RpcLog, err: Option<&Value>) {
        log.server_reply(self.msg.seqno, &self.msg.method, err, self.res.as_ref());
    }

    /// Write `[Response, seqno, err, res]`. Failures are logged and returned,
    /// never retried.
    pub async fn reply(&self, tx: &dyn Transmitter, log: &dyn RpcLog) -> Result<()> {
        let reply = Reply {
            seqno: self.msg.seqno,
            error: self.err.clone(),
            result: self.res.clone(),
        };
        if let Err(e) = tx.encode(&reply).await {
            log.warning(&format!("Reply error for {}: {}", self.msg.seqno, e));
            return Err(e);
        }
        Ok(())
    }

    pub fn serve(
        mut self,
        dec: &mut dyn Decoder,
        handler: &ServeHandlerDescription,
        ctx: &ServeContext,
        admission: Option<OwnedSemaphorePermit>,
    ) -> JoinHandle<()> {
        let prof = ctx.log.start_profiler(format!("serve {}", self.msg.method));
        let decoded = handler.get_arg(dec, &mut self.msg.envelope);
        let ctx = ctx.clone();

        tokio::spawn(async move {
            let decode_err = decode_failure(&decoded.invocation);
            self.log_invocation(ctx.log.as_ref(), decode_err.as_ref(), decoded.raw.as_ref());

            let outcome = run_invocation(decoded.invocation).await;
            // permit covers the handler run only, never the reply write
            drop(admission);

            match outcome {
                Ok(res) => {
                    self.err = None;
                    self.res = Some(res);
                }
                Err(e) => {
                    self.err = wrap_error(ctx.wrap.as_ref(), Some(&e));
                    self.res = None;
                }
            }

            prof.stop();
            self.log_completion(ctx.log.as_ref(), self.err.as_ref());
            if let Err(e) = self.reply(ctx.transmitter.as_ref(), ctx.log.as_ref()).await {
                ctx.log.server_reply_failed(self.msg.seqno, &self.msg.method, &e);
            }
        })
    }
}

impl Default for CallRequest {
    fn default() -> Self {
        Self::new()
    }
}
