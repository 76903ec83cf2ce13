//! Health reporting for load balancer probes.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

use crate::lifecycle::ShutdownState;
use crate::observability::metrics;
use crate::store::PeopleStore;

pub const MSG_OK: &str = "OK";
pub const MSG_SHUTTING_DOWN: &str = "Service Unavailable - Shutting down";
pub const MSG_DATABASE_FAILED: &str = "Service Unavailable - Database connection failed";

/// Outcome of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub status: StatusCode,
    pub message: &'static str,
}

impl HealthReport {
    fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            message: MSG_OK,
        }
    }

    fn unavailable(message: &'static str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Answers "should this instance receive traffic?".
#[derive(Clone)]
pub struct HealthReporter {
    state: Arc<ShutdownState>,
    store: Arc<dyn PeopleStore>,
    probe_timeout: Duration,
}

impl HealthReporter {
    pub fn new(state: Arc<ShutdownState>, store: Arc<dyn PeopleStore>, probe_timeout: Duration) -> Self {
        Self {
            state,
            store,
            probe_timeout,
        }
    }

    /// Current health. Draining wins over the store probe; the probe is never
    /// retried here since the balancer polls again on its own cadence.
    pub async fn current_health(&self) -> HealthReport {
        let report = if self.state.is_draining() {
            HealthReport::unavailable(MSG_SHUTTING_DOWN)
        } else {
            match tokio::time::timeout(self.probe_timeout, self.store.ping()).await {
                Ok(Ok(())) => HealthReport::ok(),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Health check failed");
                    HealthReport::unavailable(MSG_DATABASE_FAILED)
                }
                Err(_) => {
                    tracing::error!(
                        timeout_ms = self.probe_timeout.as_millis() as u64,
                        "Health check failed: liveness probe timed out"
                    );
                    HealthReport::unavailable(MSG_DATABASE_FAILED)
                }
            }
        };

        metrics::record_health(report.status.as_u16());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn reporter(store: Arc<MemoryStore>) -> (HealthReporter, Arc<ShutdownState>) {
        let state = Arc::new(ShutdownState::new());
        let reporter = HealthReporter::new(state.clone(), store, Duration::from_secs(2));
        (reporter, state)
    }

    #[tokio::test]
    async fn healthy_with_reachable_store() {
        let (reporter, _) = reporter(Arc::new(MemoryStore::new()));
        let report = reporter.current_health().await;
        assert_eq!(report, HealthReport::ok());
        assert!(report.is_healthy());
    }

    #[tokio::test]
    async fn draining_reports_shutting_down() {
        let (reporter, state) = reporter(Arc::new(MemoryStore::new()));
        state.begin_draining();

        let report = reporter.current_health().await;
        assert_eq!(report.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.message, MSG_SHUTTING_DOWN);
    }

    #[tokio::test]
    async fn draining_wins_over_store_outage() {
        let store = Arc::new(MemoryStore::new());
        store.set_reachable(false);
        let (reporter, state) = reporter(store);
        state.begin_draining();

        assert_eq!(reporter.current_health().await.message, MSG_SHUTTING_DOWN);
    }

    #[tokio::test]
    async fn store_outage_reports_database_failure() {
        let store = Arc::new(MemoryStore::new());
        store.set_reachable(false);
        let (reporter, _) = reporter(store.clone());

        let report = reporter.current_health().await;
        assert_eq!(report.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.message, MSG_DATABASE_FAILED);

        store.set_reachable(true);
        assert!(reporter.current_health().await.is_healthy());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_store_times_out() {
        let store = Arc::new(MemoryStore::new().with_latency(Duration::from_secs(60)));
        let (reporter, _) = reporter(store);

        let start = tokio::time::Instant::now();
        let report = reporter.current_health().await;
        assert_eq!(report.message, MSG_DATABASE_FAILED);
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
