//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use people_app::config::{AppConfig, StoreBackend};
use people_app::lifecycle::{Service, ShutdownRequest, ShutdownState, SHUTDOWN_CHANNEL_CAPACITY};
use people_app::PeopleStore;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A service running on an ephemeral port.
pub struct TestApp {
    pub addr: SocketAddr,
    pub shutdown: mpsc::Sender<ShutdownRequest>,
    pub state: Arc<ShutdownState>,
    pub server: JoinHandle<Result<(), std::io::Error>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the coordinator has flipped the draining flag.
    #[allow(dead_code)]
    pub async fn wait_until_draining(&self) {
        for _ in 0..200 {
            if self.state.is_draining() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("service never started draining");
    }
}

pub fn config_with_drain_window(drain_window: Duration) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.database.backend = StoreBackend::Memory;
    config.shutdown.drain_window_ms = drain_window.as_millis() as u64;
    config.health.probe_timeout_ms = 500;
    config
}

/// Start the service with `store` and return once it is accepting.
pub async fn spawn_app(config: AppConfig, store: Arc<dyn PeopleStore>) -> TestApp {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let service = Service::new(config, store);
    let state = service.shutdown_state();

    let (tx, rx) = mpsc::channel(SHUTDOWN_CHANNEL_CAPACITY);
    let server = tokio::spawn(service.serve(listener, rx));

    TestApp {
        addr,
        shutdown: tx,
        state,
        server,
    }
}

/// A client that never reuses connections across requests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
