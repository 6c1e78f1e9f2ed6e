//! Interrupt handling for long-running commands.
//!
//! Ctrl-C (and SIGTERM on Unix) flips a `watch` flag that every
//! [`tasklog_providers::RunContext`] observes, so in-flight list and delete
//! calls stop at the next await point instead of killing the process
//! mid-write.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Shared cancellation flag fed by process signals.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Spawns the signal listener task. Call once, from inside the runtime.
    pub fn spawn_listener(&self) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            let _ = tx.send(true);
            debug!("signal listener stopped");
        });
    }

    /// A receiver for [`tasklog_providers::RunContext::new`].
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    /// Programmatically requests cancellation.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        () = ctrl_c() => {}
        _ = sigterm.recv() => info!("Received SIGTERM, cancelling"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, cancelling"),
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
