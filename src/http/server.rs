//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, in-flight tracking)
//! - Serve on a listener until the drain coordinator closes it

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::health::HealthReporter;
use crate::http::health::health_handler;
use crate::http::info::{database_info_handler, server_info_handler};
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::lifecycle::{CloseSignal, ShutdownState};
use crate::net::{track_in_flight, InFlightTracker};
use crate::store::PeopleStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthReporter,
    pub store: Arc<dyn PeopleStore>,
}

/// HTTP server for the people app.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn PeopleStore>,
        shutdown: Arc<ShutdownState>,
        in_flight: InFlightTracker,
    ) -> Self {
        let health = HealthReporter::new(
            shutdown,
            store.clone(),
            Duration::from_millis(config.health.probe_timeout_ms),
        );
        let state = AppState { health, store };

        let router = Self::build_router(&config, state, in_flight);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, in_flight: InFlightTracker) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/health", get(health_handler))
            .route("/api/server-info", get(server_info_handler))
            .route("/api/database-info", get(database_info_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(in_flight, track_in_flight))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Run the server on `listener` until `close` fires, then wait for open
    /// connections to finish.
    pub async fn run(self, listener: TcpListener, close: CloseSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(close.closed())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
