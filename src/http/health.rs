//! Health endpoint handler.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::request::request_id;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

/// `GET /health` and `GET /api/health`.
///
/// Always asks the client to close the connection so keep-alive sockets do not
/// outlive a deploy boundary.
pub async fn health_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let report = state.health.current_health().await;

    if !report.is_healthy() {
        tracing::debug!(
            request_id = %request_id(&headers),
            status = report.status.as_u16(),
            message = report.message,
            "Reporting unhealthy"
        );
    }

    (
        report.status,
        [
            (header::CONNECTION, HeaderValue::from_static("close")),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        ],
        Json(HealthBody {
            status: report.message,
        }),
    )
        .into_response()
}
