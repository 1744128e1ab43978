use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::JoinSet;
use tracing::info;

use crate::http::connection::Connection;
use crate::http::Handler;

/// How long in-flight connections get to finish once shutdown starts.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn bind(addr: impl ToSocketAddrs) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accepts connections forever, one task per connection. Every task shares
/// the same handler.
pub async fn serve<H: Handler>(listener: TcpListener, handler: H) -> anyhow::Result<()> {
    serve_with_shutdown(listener, handler, std::future::pending()).await
}

/// Accepts connections until `shutdown` resolves, then closes the listener
/// and waits up to [`DRAIN_TIMEOUT`] for open connections before aborting
/// them.
pub async fn serve_with_shutdown<H, F>(
    listener: TcpListener,
    handler: H,
    shutdown: F,
) -> anyhow::Result<()>
where
    H: Handler,
    F: Future<Output = ()>,
{
    let handler = Arc::new(handler);
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            // Reap finished tasks so the set does not grow with every client
            Some(_) = connections.join_next(), if !connections.is_empty() => {}

            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        // Per-connection failures (e.g. EMFILE) must not stop the listener
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                };
                tracing::debug!(%peer, "Accepted connection");

                let handler = Arc::clone(&handler);
                connections.spawn(async move {
                    let mut conn = Connection::new(socket, handler);
                    if let Err(e) = conn.run().await {
                        tracing::error!(%peer, error = %e, "Connection error");
                    }
                });
            }
        }
    }

    drop(listener);
    info!(open = connections.len(), "Stopped accepting connections");

    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            open = connections.len(),
            "Drain timed out, aborting remaining connections"
        );
        connections.shutdown().await;
    }

    Ok(())
}

pub async fn run<H, F>(listen_addr: &str, handler: H, shutdown: F) -> anyhow::Result<()>
where
    H: Handler,
    F: Future<Output = ()>,
{
    let listener = bind(listen_addr).await?;
    serve_with_shutdown(listener, handler, shutdown).await
}
