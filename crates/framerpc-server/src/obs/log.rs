//! Request log sink.
//!
//! `RpcLog` is the capability set the serve path reports through: call and
//! notify invocation/completion, cancel intent, warnings and profiling spans.
//! `TracingLog` is the production sink; it emits structured `tracing` events
//! and feeds the metrics registry.

use std::sync::Arc;
use std::time::Instant;

use framerpc_core::protocol::SeqNumber;
use framerpc_core::{RpcError, Value};

use crate::handler::HandlerRegistry;
use crate::obs::metrics::ServerMetrics;

/// Metric label for methods with no registered handler.
pub const UNKNOWN_METHOD: &str = "unknown";

/// Open profiling span; `stop` closes it.
pub trait Profiler: Send {
    fn stop(self: Box<Self>);
}

/// Log capabilities used by the request variants.
pub trait RpcLog: Send + Sync {
    fn server_call(&self, seqno: SeqNumber, method: &str, err: Option<&RpcError>, arg: Option<&Value>);
    fn server_reply(&self, seqno: SeqNumber, method: &str, err: Option<&Value>, res: Option<&Value>);
    fn server_notify_call(&self, method: &str, err: Option<&RpcError>, arg: Option<&Value>);
    fn server_notify_complete(&self, method: &str, err: Option<&Value>);
    fn server_cancel_call(&self, seqno: SeqNumber, method: &str);
    fn server_reply_failed(&self, seqno: SeqNumber, method: &str, err: &RpcError);
    fn start_profiler(&self, label: String) -> Box<dyn Profiler>;
    fn warning(&self, msg: &str);
}

/// `tracing`-backed sink.
///
/// Method names come straight off the wire, so metric labels only carry
/// names the registry knows; everything else is counted as `unknown`.
#[derive(Clone, Default)]
pub struct TracingLog {
    metrics: Option<Arc<ServerMetrics>>,
    registry: Option<Arc<HandlerRegistry>>,
}

impl TracingLog {
    pub fn with_metrics(metrics: Arc<ServerMetrics>, registry: Arc<HandlerRegistry>) -> Self {
        Self {
            metrics: Some(metrics),
            registry: Some(registry),
        }
    }

    fn method_label<'a>(&self, method: &'a str) -> &'a str {
        match &self.registry {
            Some(r) if r.contains(method) => method,
            _ => UNKNOWN_METHOD,
        }
    }

    /// `"<op> <method>"` with the method bounded like every other label.
    fn profile_label(&self, label: &str) -> String {
        match label.split_once(' ') {
            Some((op, method)) => format!("{op} {}", self.method_label(method)),
            None => label.to_owned(),
        }
    }

    fn count_request(&self, kind: &str, method: &str) {
        if let Some(m) = &self.metrics {
            m.requests.inc(&[("kind", kind), ("method", self.method_label(method))]);
        }
    }
}

impl RpcLog for TracingLog {
    fn server_call(&self, seqno: SeqNumber, method: &str, err: Option<&RpcError>, arg: Option<&Value>) {
        self.count_request("call", method);
        match err {
            Some(e) => {
                if let Some(m) = &self.metrics {
                    m.decode_errors.inc(&[("kind", "call")]);
                }
                tracing::warn!(seqno, method, error = %e, "call: argument decode failed");
            }
            None => tracing::debug!(seqno, method, arg = ?arg, "call"),
        }
    }

    fn server_reply(&self, seqno: SeqNumber, method: &str, err: Option<&Value>, res: Option<&Value>) {
        match err {
            Some(e) => {
                if let Some(m) = &self.metrics {
                    m.handler_errors
                        .inc(&[("kind", "call"), ("method", self.method_label(method))]);
                }
                tracing::info!(seqno, method, error = %e, "reply: error");
            }
            None => tracing::debug!(seqno, method, res = ?res, "reply"),
        }
    }

    fn server_notify_call(&self, method: &str, err: Option<&RpcError>, arg: Option<&Value>) {
        self.count_request("notify", method);
        match err {
            Some(e) => {
                if let Some(m) = &self.metrics {
                    m.decode_errors.inc(&[("kind", "notify")]);
                }
                tracing::warn!(method, error = %e, "notify: argument decode failed");
            }
            None => tracing::debug!(method, arg = ?arg, "notify"),
        }
    }

    fn server_notify_complete(&self, method: &str, err: Option<&Value>) {
        match err {
            Some(e) => {
                if let Some(m) = &self.metrics {
                    m.handler_errors
                        .inc(&[("kind", "notify"), ("method", self.method_label(method))]);
                }
                tracing::info!(method, error = %e, "notify complete: error");
            }
            None => tracing::debug!(method, "notify complete"),
        }
    }

    fn server_cancel_call(&self, seqno: SeqNumber, method: &str) {
        self.count_request("cancel", method);
        tracing::info!(seqno, method, "cancel requested");
    }

    fn server_reply_failed(&self, seqno: SeqNumber, method: &str, err: &RpcError) {
        if let Some(m) = &self.metrics {
            m.reply_failures.inc(&[("code", err.code().as_str())]);
        }
        tracing::debug!(seqno, method, error = %err, "reply dropped");
    }

    fn start_profiler(&self, label: String) -> Box<dyn Profiler> {
        Box::new(SpanProfiler {
            span: tracing::debug_span!("serve", label = %label),
            label: self.profile_label(&label),
            started: Instant::now(),
            metrics: self.metrics.clone(),
        })
    }

    fn warning(&self, msg: &str) {
        if let Some(m) = &self.metrics {
            m.warnings.inc(&[]);
        }
        tracing::warn!("{msg}");
    }
}

/// Profiler backed by a `tracing` span and a wall clock.
struct SpanProfiler {
    span: tracing::Span,
    label: String,
    started: Instant,
    metrics: Option<Arc<ServerMetrics>>,
}

impl Profiler for SpanProfiler {
    fn stop(self: Box<Self>) {
        let elapsed = self.started.elapsed();
        if let Some(m) = &self.metrics {
            m.serve_duration.observe(&[("label", self.label.as_str())], elapsed);
        }
        let _enter = self.span.enter();
        tracing::debug!(elapsed_us = elapsed.as_micros() as u64, "profile stop");
    }
}
