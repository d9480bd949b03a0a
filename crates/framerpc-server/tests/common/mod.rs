//! Recording collaborators shared by the integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use framerpc_core::error::{Result, RpcError};
use framerpc_core::protocol::{MsgPackDecoder, Reply, SeqNumber};
use framerpc_core::Value;
use framerpc_server::obs::{Profiler, RpcLog};
use framerpc_server::request::ServeContext;
use framerpc_server::transport::Transmitter;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Call {
        seqno: SeqNumber,
        method: String,
        err: Option<String>,
        arg: Option<Value>,
    },
    Reply {
        seqno: SeqNumber,
        method: String,
        err: Option<Value>,
        res: Option<Value>,
    },
    NotifyCall {
        method: String,
        err: Option<String>,
        arg: Option<Value>,
    },
    NotifyComplete {
        method: String,
        err: Option<Value>,
    },
    Cancel {
        seqno: SeqNumber,
        method: String,
    },
    ReplyFailed {
        seqno: SeqNumber,
        method: String,
        code: &'static str,
    },
    ProfileStart(String),
    ProfileStop(String),
    Warning(String),
}

#[derive(Clone, Default)]
pub struct RecordingLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingLog {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, e: Event) {
        self.events.lock().unwrap().push(e);
    }
}

struct RecordingProfiler {
    label: String,
    events: Arc<Mutex<Vec<Event>>>,
}

impl Profiler for RecordingProfiler {
    fn stop(self: Box<Self>) {
        self.events.lock().unwrap().push(Event::ProfileStop(self.label));
    }
}

impl RpcLog for RecordingLog {
    fn server_call(&self, seqno: SeqNumber, method: &str, err: Option<&RpcError>, arg: Option<&Value>) {
        self.push(Event::Call {
            seqno,
            method: method.into(),
            err: err.map(|e| e.to_string()),
            arg: arg.cloned(),
        });
    }

    fn server_reply(&self, seqno: SeqNumber, method: &str, err: Option<&Value>, res: Option<&Value>) {
        self.push(Event::Reply {
            seqno,
            method: method.into(),
            err: err.cloned(),
            res: res.cloned(),
        });
    }

    fn server_notify_call(&self, method: &str, err: Option<&RpcError>, arg: Option<&Value>) {
        self.push(Event::NotifyCall {
            method: method.into(),
            err: err.map(|e| e.to_string()),
            arg: arg.cloned(),
        });
    }

    fn server_notify_complete(&self, method: &str, err: Option<&Value>) {
        self.push(Event::NotifyComplete {
            method: method.into(),
            err: err.cloned(),
        });
    }

    fn server_cancel_call(&self, seqno: SeqNumber, method: &str) {
        self.push(Event::Cancel {
            seqno,
            method: method.into(),
        });
    }

    fn server_reply_failed(&self, seqno: SeqNumber, method: &str, err: &RpcError) {
        self.push(Event::ReplyFailed {
            seqno,
            method: method.into(),
            code: err.code().as_str(),
        });
    }

    fn start_profiler(&self, label: String) -> Box<dyn Profiler> {
        self.push(Event::ProfileStart(label.clone()));
        Box::new(RecordingProfiler {
            label,
            events: Arc::clone(&self.events),
        })
    }

    fn warning(&self, msg: &str) {
        self.push(Event::Warning(msg.into()));
    }
}

#[derive(Default)]
pub struct RecordingTransmitter {
    replies: Mutex<Vec<Reply>>,
    fail: bool,
}

impl RecordingTransmitter {
    pub fn failing() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transmitter for RecordingTransmitter {
    async fn encode(&self, reply: &Reply) -> Result<()> {
        if self.fail {
            return Err(RpcError::Transmission(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "peer went away",
            )));
        }
        self.replies.lock().unwrap().push(reply.clone());
        Ok(())
    }
}

/// Collaborators plus handles to inspect them afterwards.
pub struct Harness {
    pub log: RecordingLog,
    pub tx: Arc<RecordingTransmitter>,
    pub ctx: ServeContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_transmitter(RecordingTransmitter::default())
    }

    pub fn with_transmitter(tx: RecordingTransmitter) -> Self {
        let log = RecordingLog::default();
        let tx = Arc::new(tx);
        let ctx = ServeContext::new(tx.clone(), Arc::new(log.clone()));
        Self { log, tx, ctx }
    }
}

/// Positional fields back to back, without an array header.
pub fn fields(values: &[Value]) -> MsgPackDecoder {
    let mut buf = Vec::new();
    for v in values {
        rmpv::encode::write_value(&mut buf, v).unwrap();
    }
    MsgPackDecoder::new(Bytes::from(buf))
}

/// Whole message as the dispatcher sees it (array, no length prefix).
pub fn message<T: serde::Serialize>(fields: &T) -> Bytes {
    Bytes::from(rmp_serde::to_vec(fields).unwrap())
}
