//! Poller lifecycle orchestration
//!
//! The orchestrator builds one [`HttpPoller`] per configured page, wires the
//! shared [`ResponseRouter`] in as the result callback and spawns each
//! poller onto its own tokio task. All tasks share a single `watch`
//! shutdown channel; the returned [`WatchHandle`] joins every started task
//! so shutdown can wait for full quiescence before external connections are
//! released.
//!
//! Starting is independent per page: a creation failure is logged and
//! counted but never prevents the remaining pollers from starting.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::WatchContext;
use crate::poller::HttpPoller;
use crate::router::ResponseRouter;

/// Builds and starts the polling tasks
pub struct Orchestrator {
    ctx: Arc<WatchContext>,
}

impl Orchestrator {
    /// Create an orchestrator over the frozen configuration
    pub fn new(ctx: Arc<WatchContext>) -> Self {
        Self { ctx }
    }

    /// Create one poller per page and spawn each started one
    ///
    /// Configuration is complete before this is called, so the router only
    /// ever reads immutable state.
    pub fn start(&self) -> WatchHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let router = Arc::new(ResponseRouter::new(self.ctx.clone()));

        let mut tasks = Vec::with_capacity(self.ctx.pages.len());
        let mut failed = 0usize;

        for spec in self.ctx.pages.values() {
            match HttpPoller::new(spec) {
                Ok(mut poller) => {
                    poller.set_handler(router.clone());
                    let rx = shutdown_rx.clone();
                    tasks.push(tokio::spawn(async move { poller.run(rx).await }));
                }
                Err(err) => {
                    tracing::error!(url = %spec.url, error = %err, "could not create poller");
                    failed += 1;
                }
            }
        }

        tracing::info!(started = tasks.len(), failed, "pollers started");

        WatchHandle {
            tasks,
            shutdown: shutdown_tx,
            failed,
        }
    }
}

/// Handle over the running polling tasks
pub struct WatchHandle {
    tasks: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
    /// Pages whose poller could not be created
    pub failed: usize,
}

impl WatchHandle {
    /// Number of tasks that actually started
    pub fn started(&self) -> usize {
        self.tasks.len()
    }

    /// Propagate cancellation and wait until every started task has exited
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);

        for task in self.tasks {
            if let Err(err) = task.await {
                tracing::error!(error = %err, "poller task did not exit cleanly");
            }
        }

        tracing::info!("all pollers stopped");
    }
}
