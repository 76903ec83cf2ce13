//! Startup orchestration.
//!
//! # Responsibilities
//! - Prepare the backing store (schema bootstrap)
//! - Wire shutdown state, drain coordinator and HTTP server together
//! - Serve until the coordinator closes the listener
//!
//! # Design Decisions
//! - A failed schema bootstrap is logged, not fatal; health reports the outage
//! - The shutdown request channel is handed in so callers choose the source
//!   (OS signals in `main`, direct sends in tests)
//! - The channel exists before the schema bootstrap, so a signal sent while
//!   the database is slow is queued and honored once serving starts

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::{DrainCoordinator, ShutdownRequest, ShutdownState};
use crate::net::InFlightTracker;
use crate::store::PeopleStore;

/// Capacity of the shutdown request channel. Only a handful of signals ever
/// arrive per process.
pub const SHUTDOWN_CHANNEL_CAPACITY: usize = 4;

/// A fully wired service, ready to serve.
pub struct Service {
    config: AppConfig,
    store: Arc<dyn PeopleStore>,
    state: Arc<ShutdownState>,
    in_flight: InFlightTracker,
}

impl Service {
    pub fn new(config: AppConfig, store: Arc<dyn PeopleStore>) -> Self {
        Self {
            config,
            store,
            state: Arc::new(ShutdownState::new()),
            in_flight: InFlightTracker::new(),
        }
    }

    /// The draining flag shared with the health endpoint.
    pub fn shutdown_state(&self) -> Arc<ShutdownState> {
        self.state.clone()
    }

    pub fn in_flight(&self) -> InFlightTracker {
        self.in_flight.clone()
    }

    /// Create the person table if needed. Errors are logged and swallowed.
    pub async fn prepare_store(&self) {
        match self.store.ensure_schema().await {
            Ok(()) => tracing::info!(kind = self.store.kind(), "Store ready"),
            Err(e) => tracing::warn!(
                kind = self.store.kind(),
                error = %e,
                "Schema bootstrap failed, continuing; health will report the database"
            ),
        }
    }

    /// Bootstrap the store, then serve. Requests already queued on `requests`
    /// are handled as soon as the coordinator starts.
    pub async fn start(
        self,
        listener: TcpListener,
        requests: mpsc::Receiver<ShutdownRequest>,
    ) -> Result<(), std::io::Error> {
        self.prepare_store().await;
        self.serve(listener, requests).await
    }

    /// Serve on `listener` until a shutdown request closes it.
    pub async fn serve(
        self,
        listener: TcpListener,
        requests: mpsc::Receiver<ShutdownRequest>,
    ) -> Result<(), std::io::Error> {
        let drain_window = Duration::from_millis(self.config.shutdown.drain_window_ms);
        let (coordinator, close) = DrainCoordinator::new(self.state.clone(), drain_window, self.in_flight.clone());
        let coordinator_task = tokio::spawn(coordinator.run(requests));

        let server = HttpServer::new(self.config, self.store, self.state, self.in_flight);
        let result = server.run(listener, close).await;

        coordinator_task.abort();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;
    use crate::store::MemoryStore;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.backend = StoreBackend::Memory;
        config.shutdown.drain_window_ms = 50;
        config
    }

    #[tokio::test]
    async fn unreachable_store_does_not_block_startup() {
        let store = Arc::new(MemoryStore::new());
        store.set_reachable(false);

        let service = Service::new(memory_config(), store);
        service.prepare_store().await;
        assert!(!service.shutdown_state().is_draining());
    }

    #[tokio::test]
    async fn serve_returns_after_graceful_drain() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let service = Service::new(memory_config(), Arc::new(MemoryStore::new()));
        let state = service.shutdown_state();
        let in_flight = service.in_flight();

        let (tx, rx) = mpsc::channel(SHUTDOWN_CHANNEL_CAPACITY);
        tx.send(ShutdownRequest::Graceful).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), service.serve(listener, rx))
            .await
            .expect("drain window is 50ms")
            .unwrap();
        assert!(state.is_draining());
        assert_eq!(in_flight.active_count(), 0);
    }

    #[tokio::test]
    async fn signal_during_slow_bootstrap_is_honored() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let store = MemoryStore::new().with_latency(Duration::from_millis(300));
        let service = Service::new(memory_config(), Arc::new(store));
        let state = service.shutdown_state();

        let (tx, rx) = mpsc::channel(SHUTDOWN_CHANNEL_CAPACITY);
        let server = tokio::spawn(service.start(listener, rx));

        // Bootstrap is still waiting on the store.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!server.is_finished());
        tx.send(ShutdownRequest::Graceful).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("queued graceful request drains after bootstrap")
            .unwrap()
            .unwrap();
        assert!(state.is_draining());
    }

    #[tokio::test]
    async fn immediate_during_slow_bootstrap_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let store = MemoryStore::new().with_latency(Duration::from_millis(300));
        let service = Service::new(memory_config(), Arc::new(store));
        let state = service.shutdown_state();

        let (tx, rx) = mpsc::channel(SHUTDOWN_CHANNEL_CAPACITY);
        tx.send(ShutdownRequest::Immediate).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), service.start(listener, rx))
            .await
            .expect("queued immediate request closes after bootstrap")
            .unwrap();
        assert!(!state.is_draining());
    }
}
