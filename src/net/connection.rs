//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count requests currently being served
//! - Give each tracked request a unique ID for tracing
//! - Report the count while the service drains
//!
//! # Design Decisions
//! - A guard decrements on drop, so panicking handlers are still accounted for
//! - Tracking is informational; nothing waits on the count reaching zero

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

/// Global atomic counter for request sequence numbers.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static REQUEST_SEQ_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-local sequence number for a tracked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestSeq(u64);

impl RequestSeq {
    pub fn new() -> Self {
        Self(REQUEST_SEQ_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RequestSeq {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Tracks requests that are currently being served.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active_count: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        let now = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_in_flight(now);
        InFlightGuard {
            active_count: Arc::clone(&self.active_count),
            seq: RequestSeq::new(),
        }
    }

    /// Current number of in-flight requests.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a request's lifetime.
#[derive(Debug)]
pub struct InFlightGuard {
    active_count: Arc<AtomicU64>,
    seq: RequestSeq,
}

impl InFlightGuard {
    pub fn seq(&self) -> RequestSeq {
        self.seq
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_in_flight(now);
        tracing::trace!(seq = %self.seq, in_flight = now, "Request finished");
    }
}

/// Metrics label for unrouted requests, so arbitrary 404 paths share one series.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Route template the request matched (e.g. `/api/health`), or [`UNMATCHED_ROUTE`].
pub fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Middleware holding an [`InFlightGuard`] for the duration of each request.
pub async fn track_in_flight(
    State(tracker): State<InFlightTracker>,
    request: Request,
    next: Next,
) -> Response {
    let guard = tracker.track();
    let method = request.method().to_string();
    let route = route_label(&request);
    let start = std::time::Instant::now();

    tracing::trace!(seq = %guard.seq(), method = %method, path = %request.uri().path(), "Request started");

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    drop(guard);

    response
}
