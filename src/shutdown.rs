//! Signal-driven graceful shutdown
//!
//! The first of SIGHUP, SIGINT or SIGQUIT triggers shutdown: cancellation
//! is propagated to every polling task, the coordinator blocks until all of
//! them have exited, and only then are the external connections released in
//! reverse acquisition order (backend, pub/sub client, notifier). Repeated
//! signals while shutting down are not treated specially.

use std::io;
use std::sync::Arc;

use crate::config::WatchContext;
use crate::orchestrator::WatchHandle;

/// Block until a termination signal arrives
#[cfg(unix)]
pub async fn wait_for_signal() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = hangup.recv() => tracing::info!("received SIGHUP"),
        _ = interrupt.recv() => tracing::info!("received SIGINT"),
        _ = quit.recv() => tracing::info!("received SIGQUIT"),
    }

    Ok(())
}

/// Block until ctrl-c on platforms without unix signals
#[cfg(not(unix))]
pub async fn wait_for_signal() -> io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("received interrupt");
    Ok(())
}

/// Wait for a termination signal, then tear the pipeline down
///
/// Returns once every polling task has exited and all external connections
/// have been released.
pub async fn run(handle: WatchHandle, ctx: Arc<WatchContext>) -> io::Result<()> {
    wait_for_signal().await?;

    tracing::info!("shutdown signal received, stopping pollers");
    handle.shutdown().await;

    release_connections(&ctx).await;
    tracing::info!("shutdown complete");

    Ok(())
}

/// Release external connections in reverse acquisition order
pub async fn release_connections(ctx: &WatchContext) {
    if let Some(backend) = &ctx.backend {
        backend.close().await;
    }
    if let Some(publisher) = &ctx.publisher {
        publisher.close().await;
    }
    if let Some(notifier) = &ctx.notifier {
        notifier.close().await;
    }
}
