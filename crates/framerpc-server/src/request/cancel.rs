use framerpc_core::error::Result;
use framerpc_core::protocol::envelope::{method_slot, seqno_slot};
use framerpc_core::protocol::{DecodeSlot, Envelope, Message, SeqNumber};
use framerpc_core::{RpcError, Value};

use crate::obs::RpcLog;
use crate::transport::Transmitter;

/// `[seqno, method]`
const CANCEL_FIELDS: usize = 2;
static CANCEL_SLOTS: [DecodeSlot; 2] = [seqno_slot, method_slot];

/// Cancellation intent for an outstanding call.
///
/// Observation only: it is logged, and nothing interrupts the running call.
#[derive(Debug, Clone)]
pub struct CancelRequest {
    pub(crate) msg: Message,
}

impl CancelRequest {
    pub fn new() -> Self {
        Self {
            msg: Message::new(Envelope::new(CANCEL_FIELDS, &CANCEL_SLOTS)),
        }
    }

    pub fn seqno(&self) -> SeqNumber {
        self.msg.seqno
    }

    pub fn method(&self) -> &str {
        &self.msg.method
    }

    pub fn log_invocation(&self, log: &dyn RpcLog, _err: Option<&RpcError>, _arg: Option<&Value>) {
        log.server_cancel_call(self.msg.seqno, &self.msg.method);
    }

    pub fn log_completion(&self, _log: &dyn RpcLog, _err: Option<&Value>) {}

    pub async fn reply(&self, _tx: &dyn Transmitter, _log: &dyn RpcLog) -> Result<()> {
        Ok(())
    }

    /// Runs on the reading context; spawns nothing.
    pub fn serve(self, log: &dyn RpcLog) {
        self.log_invocation(log, None, None);
    }
}

impl Default for CancelRequest {
    fn default() -> Self {
        Self::new()
    }
}
