//! Deadline and cancellation for remote calls.
//!
//! A [`RunContext`] is created once per command and threaded through every
//! page fetch and delete call. Each guarded call fails with
//! `DeadlineExceeded` once the overall deadline passes, or with `Cancelled`
//! as soon as the cancel flag flips to `true`.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Shared limits for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    deadline: Option<Instant>,
    cancel: watch::Receiver<bool>,
}

impl RunContext {
    /// Creates a context that expires `timeout` from now, if given, and is
    /// cancelled when `cancel` becomes `true`.
    pub fn new(timeout: Option<Duration>, cancel: watch::Receiver<bool>) -> Self {
        Self {
            deadline: timeout.map(|t| Instant::now() + t),
            cancel,
        }
    }

    /// A context with no deadline that can never be cancelled.
    pub fn unbounded() -> Self {
        // A dropped sender is treated as "never cancelled".
        let (_tx, rx) = watch::channel(false);
        Self::new(None, rx)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Runs `fut` under the context's deadline and cancellation.
    ///
    /// `operation` names the call in errors and logs.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> ProviderResult<T>
    where
        F: Future<Output = ProviderResult<T>>,
    {
        if self.is_cancelled() {
            return Err(ProviderError::cancelled(format!("{operation}: run cancelled")));
        }
        if self.remaining().is_some_and(|r| r.is_zero()) {
            return Err(ProviderError::deadline_exceeded(format!(
                "{operation}: run deadline already passed"
            )));
        }

        let mut cancel = self.cancel.clone();
        let cancelled = async move {
            if cancel.wait_for(|flag| *flag).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        let guarded = async {
            tokio::select! {
                result = fut => result,
                () = cancelled => {
                    debug!(operation, "cancelled while in flight");
                    Err(ProviderError::cancelled(format!("{operation}: run cancelled")))
                }
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or_else(|_| {
                    debug!(operation, "deadline reached while in flight");
                    Err(ProviderError::deadline_exceeded(format!(
                        "{operation}: run deadline exceeded"
                    )))
                }),
            None => guarded.await,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::unbounded()
    }
}
