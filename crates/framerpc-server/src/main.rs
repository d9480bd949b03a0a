//! framerpc server binary.
//!
//! - Loads `framerpc.yaml` (or the path given as the first argument)
//! - Registers the built-in methods
//! - Serves framed msgpack RPC over TCP until ctrl-c
//! - Optionally exposes `/healthz` and `/metrics` on `ops.listen`

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use framerpc_core::error::{Result, RpcError};
use framerpc_server::{app_state::AppState, config, ops, server};

fn parse_addr(field: &str, s: &str) -> Result<SocketAddr> {
    s.parse()
        .map_err(|e| RpcError::Config(format!("{field} must be a valid SocketAddr: {e}")))
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "framerpc.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen = parse_addr("server.listen", &cfg.server.listen)?;
    let ops_listen = match &cfg.ops {
        Some(ops) => Some(parse_addr("ops.listen", &ops.listen)?),
        None => None,
    };

    let state = AppState::new(cfg)?;

    if let Some(addr) = ops_listen {
        let app = ops::build_router(state.clone());
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "ops endpoints listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "ops server failed");
            }
        });
    }

    let listener = TcpListener::bind(listen).await?;
    tracing::info!(%listen, "framerpc-server starting");

    tokio::select! {
        res = server::serve(listener, state.dispatcher()) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            Ok(())
        }
    }
}
