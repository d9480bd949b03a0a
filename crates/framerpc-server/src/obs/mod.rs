//! Observability: the request log sink and a dependency-free metrics registry.
//!
//! The log sink is the only place the serve path reports to; `TracingLog`
//! forwards into `tracing` and counts into `ServerMetrics`, which the ops
//! `/metrics` endpoint renders in Prometheus text format.

pub mod log;
pub mod metrics;

pub use log::{Profiler, RpcLog, TracingLog, UNKNOWN_METHOD};
pub use metrics::ServerMetrics;
