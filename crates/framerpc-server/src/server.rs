//! TCP accept loop: one dispatch loop per connection.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::Instrument;

use framerpc_core::error::Result;

use crate::dispatch::Dispatcher;

/// Accept connections forever, serving each on its own task.
pub async fn serve(listener: TcpListener, dispatcher: Arc<Dispatcher>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "set_nodelay failed");
        }

        let dispatcher = Arc::clone(&dispatcher);
        let span = tracing::info_span!("conn", %peer);
        tokio::spawn(
            async move {
                tracing::debug!("connection opened");
                let (rd, wr) = stream.into_split();
                match dispatcher.serve_connection(rd, wr).await {
                    Ok(()) => tracing::debug!("connection closed"),
                    Err(e) => tracing::warn!(error = %e, "connection ended with error"),
                }
            }
            .instrument(span),
        );
    }
}
