//! Shared application state for the framerpc server.
//!
//! Wires config, handler registry, log sink, metrics and the dispatcher.
//! Startup errors are returned, never panicked on.

use std::sync::Arc;

use framerpc_core::error::Result;

use crate::config::{ErrorFormat, ServerConfig};
use crate::dispatch::Dispatcher;
use crate::handler::HandlerRegistry;
use crate::obs::{ServerMetrics, TracingLog};
use crate::services::register_builtins;
use crate::wrap::status_wrap;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<ServerMetrics>,
}

impl AppState {
    /// Build state with the built-in methods registered.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let registry = HandlerRegistry::new();
        register_builtins(&registry);
        Self::with_registry(cfg, registry)
    }

    /// Build state around a caller-populated registry.
    pub fn with_registry(cfg: ServerConfig, registry: HandlerRegistry) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(ServerMetrics::default());
        let registry = Arc::new(registry);
        let log = Arc::new(TracingLog::with_metrics(
            Arc::clone(&metrics),
            Arc::clone(&registry),
        ));

        let mut dispatcher = Dispatcher::new(registry, log)
            .with_limits(cfg.server.max_in_flight, cfg.server.max_frame_bytes)
            .with_metrics(Arc::clone(&metrics));
        if cfg.server.error_format == ErrorFormat::Status {
            dispatcher = dispatcher.with_wrap(status_wrap());
        }

        tracing::info!(
            methods = ?dispatcher.registry().methods(),
            max_in_flight = cfg.server.max_in_flight,
            "dispatcher ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                dispatcher: Arc::new(dispatcher),
                metrics,
            }),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.inner.dispatcher)
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.inner.metrics
    }

    /// Prometheus text including live gauges.
    pub fn render_metrics(&self) -> String {
        let in_flight = self.inner.dispatcher.in_flight() as u64;
        self.inner
            .metrics
            .render_with(&[("framerpc_in_flight", in_flight)])
    }
}
