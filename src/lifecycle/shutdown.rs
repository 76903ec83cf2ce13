//! Shutdown coordination for the service.
//!
//! [`ShutdownState`] is the write-once draining flag read by the health
//! endpoint. [`DrainCoordinator`] drives the listener through
//! `Running → Draining → Closed` in response to [`ShutdownRequest`]s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::net::InFlightTracker;
use crate::observability::metrics;

/// Process-wide "shutdown in progress" flag.
#[derive(Debug, Default)]
pub struct ShutdownState {
    draining: AtomicBool,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a graceful shutdown has begun.
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Set the flag. Returns `true` only for the call that flipped it.
    pub fn begin_draining(&self) -> bool {
        !self.draining.swap(true, Ordering::AcqRel)
    }
}

/// What the operator or orchestrator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownRequest {
    /// Flip health, keep serving for the drain window, then close.
    Graceful,
    /// Close the listener now.
    Immediate,
}

/// Listener lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting and serving normally.
    Running,
    /// Health reports unavailable; listener still accepts.
    Draining,
    /// Listener told to stop accepting.
    Closed,
}

/// Owns the shutdown state machine.
pub struct DrainCoordinator {
    state: Arc<ShutdownState>,
    drain_window: Duration,
    in_flight: InFlightTracker,
    phase: watch::Sender<Phase>,
}

impl DrainCoordinator {
    /// Create a coordinator and the handle the server waits on.
    pub fn new(
        state: Arc<ShutdownState>,
        drain_window: Duration,
        in_flight: InFlightTracker,
    ) -> (Self, CloseSignal) {
        let (phase, rx) = watch::channel(Phase::Running);
        let coordinator = Self {
            state,
            drain_window,
            in_flight,
            phase,
        };
        (coordinator, CloseSignal { phase: rx })
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Running → Draining. Returns `false` if not currently running.
    pub fn begin_draining(&self) -> bool {
        if self.phase() != Phase::Running {
            return false;
        }

        self.state.begin_draining();
        metrics::set_draining(true);
        self.phase.send_replace(Phase::Draining);

        tracing::info!(
            drain_window_ms = self.drain_window.as_millis() as u64,
            in_flight = self.in_flight.active_count(),
            "Shutdown requested, health now reports unavailable; closing listener after drain window"
        );
        true
    }

    /// Running | Draining → Closed. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        let previous = self.phase.send_replace(Phase::Closed);
        if previous == Phase::Closed {
            return false;
        }

        tracing::info!(
            from = ?previous,
            in_flight = self.in_flight.active_count(),
            "Closing listener"
        );
        true
    }

    /// Consume shutdown requests until the listener is closed.
    pub async fn run(self, mut requests: mpsc::Receiver<ShutdownRequest>) {
        let mut deadline: Option<Instant> = None;
        let mut requests_open = true;

        loop {
            tokio::select! {
                request = requests.recv(), if requests_open => match request {
                    Some(ShutdownRequest::Graceful) => {
                        if self.begin_draining() {
                            deadline = Some(Instant::now() + self.drain_window);
                        } else {
                            tracing::debug!(phase = ?self.phase(), "Graceful shutdown already in progress");
                        }
                    }
                    Some(ShutdownRequest::Immediate) => {
                        if deadline.is_some() {
                            tracing::warn!("Immediate shutdown requested, skipping remaining drain window");
                        } else {
                            tracing::info!("Immediate shutdown requested");
                        }
                        self.close();
                        return;
                    }
                    None => {
                        requests_open = false;
                        if deadline.is_none() {
                            tracing::debug!("Shutdown request channel closed while running");
                            return;
                        }
                    }
                },
                _ = sleep_until(deadline), if deadline.is_some() => {
                    tracing::info!("Drain window elapsed");
                    self.close();
                    return;
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Resolves once the coordinator reaches [`Phase::Closed`].
#[derive(Debug, Clone)]
pub struct CloseSignal {
    phase: watch::Receiver<Phase>,
}

impl CloseSignal {
    /// Wait for the close transition.
    ///
    /// If the coordinator goes away without closing, the listener stays open.
    pub async fn closed(mut self) {
        let closed = self.phase.wait_for(|p| *p == Phase::Closed).await.map(|_| ());
        if closed.is_err() {
            std::future::pending::<()>().await;
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }
}
