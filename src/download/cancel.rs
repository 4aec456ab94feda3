//! Batch-wide cancellation: a one-way latch fired by a deadline or a signal.
//!
//! [`CancellationContext`] is the token handed to every task and every transfer.
//! [`CancellationSource`] owns the watchers (deadline timer, signal listener)
//! that are allowed to fire it.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Why a batch was cancelled. Only the first reason is ever recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The batch deadline elapsed.
    Deadline(Duration),
    /// SIGINT / SIGTERM (or Ctrl-C) was received.
    Interrupt,
    /// Cancelled programmatically by the caller.
    Manual,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deadline(limit) => write!(f, "batch deadline of {limit:?} exceeded"),
            Self::Interrupt => f.write_str("interrupted by signal"),
            Self::Manual => f.write_str("cancelled by caller"),
        }
    }
}

/// Shared, monotonic cancellation token for one batch.
///
/// Cloning is cheap and every clone observes the same latch. Once cancelled it
/// stays cancelled; further [`cancel`](Self::cancel) calls are no-ops.
#[derive(Debug, Clone, Default)]
pub struct CancellationContext {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancellationContext {
    /// Creates a fresh, uncancelled context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the latch. Returns `true` only for the call that actually fired it.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        // Reason is published before the token so any observer of
        // `is_cancelled()` also sees it.
        let first = self.reason.set(reason).is_ok();
        if first {
            warn!(%reason, "cancelling batch");
        }
        self.token.cancel();
        first
    }

    /// Returns true once the latch has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The recorded reason, if cancelled.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    /// Completes when the latch fires, yielding the reason.
    pub async fn cancelled(&self) -> CancelReason {
        self.token.cancelled().await;
        self.reason().unwrap_or(CancelReason::Manual)
    }
}

/// Owner of the background watchers that may fire a [`CancellationContext`].
///
/// Watchers are aborted when the source is dropped, so a finished batch never
/// leaves a timer or signal listener behind.
#[derive(Debug)]
pub struct CancellationSource {
    context: CancellationContext,
    watchers: Vec<JoinHandle<()>>,
}

impl CancellationSource {
    /// Wraps an existing context. Must be called inside a Tokio runtime if
    /// any watcher is attached afterwards.
    #[must_use]
    pub fn new(context: CancellationContext) -> Self {
        Self {
            context,
            watchers: Vec::new(),
        }
    }

    /// Fires the latch with [`CancelReason::Deadline`] after `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        let context = self.context.clone();
        debug!(deadline_ms = deadline.as_millis(), "arming batch deadline");
        self.watchers.push(tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(deadline) => {
                    context.cancel(CancelReason::Deadline(deadline));
                }
                () = context.token.cancelled() => {}
            }
        }));
        self
    }

    /// Fires the latch with [`CancelReason::Interrupt`] on Ctrl-C or SIGTERM.
    #[must_use]
    pub fn with_signal_handler(mut self) -> Self {
        let context = self.context.clone();
        self.watchers.push(tokio::spawn(async move {
            tokio::select! {
                signal = wait_for_shutdown_signal() => {
                    warn!(signal, "received shutdown signal, shutting down");
                    context.cancel(CancelReason::Interrupt);
                }
                () = context.token.cancelled() => {}
            }
        }));
        self
    }

    /// The context this source controls.
    #[must_use]
    pub fn context(&self) -> &CancellationContext {
        &self.context
    }
}

impl Drop for CancellationSource {
    fn drop(&mut self) {
        for watcher in &self.watchers {
            watcher.abort();
        }
    }
}

/// Waits for the first shutdown signal. Never completes if no handler can be
/// installed, so a registration failure is not mistaken for an interrupt.
async fn wait_for_shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    name = wait_for_ctrl_c() => name,
                    _ = sigterm.recv() => "SIGTERM",
                }
            }
            Err(error) => {
                warn!(%error, "failed to install SIGTERM handler");
                wait_for_ctrl_c().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await
    }
}

async fn wait_for_ctrl_c() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "SIGINT",
        Err(error) => {
            warn!(%error, "failed to install Ctrl-C handler");
            std::future::pending().await
        }
    }
}
