use anyhow::Result;
use tokio::signal;

/// Resolves on Ctrl+C or SIGTERM. The orchestrator stops a replica with
/// SIGTERM, so both must start the drain.
pub async fn wait_for_shutdown() -> Result<()> {
    tokio::select! {
        result = wait_ctrl_c() => result?,
        result = wait_sigterm() => result?,
    }

    tracing::info!("Shutdown signal received, draining connections");
    Ok(())
}

/// Like [`wait_for_shutdown`], but a failure to install the handlers is
/// logged and the future never resolves, so the server keeps running.
pub async fn shutdown_signal() {
    if wait_for_shutdown().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn wait_ctrl_c() -> Result<()> {
    signal::ctrl_c().await.map_err(|e| {
        tracing::error!(%e, "Error handling Ctrl+C signal");
        e
    })?;
    tracing::info!("Received Ctrl+C signal");
    Ok(())
}

#[cfg(unix)]
async fn wait_sigterm() -> Result<()> {
    let mut sigterm =
        signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(|e| {
            tracing::error!(%e, "Failed to install SIGTERM handler");
            e
        })?;
    sigterm.recv().await;
    tracing::info!("Received SIGTERM signal");
    Ok(())
}

#[cfg(not(unix))]
async fn wait_sigterm() -> Result<()> {
    std::future::pending::<Result<()>>().await
}
