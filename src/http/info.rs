//! Diagnostic endpoints: which instance answered, and how its database looks.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::request::request_id;
use crate::http::server::AppState;

/// Name Docker resolves to the host machine.
const DOCKER_HOST: &str = "host.docker.internal";
const HOST_LOOKUP_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub server_ip: String,
    pub request: RequestSummary,
    pub response: ResponseSummary,
}

#[derive(Debug, Serialize)]
pub struct RequestSummary {
    pub method: String,
    pub path: String,
    pub timestamp: String,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub status: u16,
    pub message: &'static str,
    pub timestamp: String,
    pub response_time_ms: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInfo {
    pub database_type: &'static str,
    pub status: &'static str,
    pub message: String,
    pub total_rows: u64,
    pub client_version: &'static str,
    pub db_latency_ms: f64,
    pub db_host: String,
}

/// `GET /api/server-info`.
pub async fn server_info_handler(method: Method, uri: Uri, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let server_ip = server_identity().await;

    let request_headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let body = ServerInfo {
        server_ip,
        request: RequestSummary {
            method: method.to_string(),
            path: uri.path().to_string(),
            timestamp: now_rfc3339(),
            headers: request_headers,
        },
        response: ResponseSummary {
            status: 200,
            message: "OK",
            timestamp: now_rfc3339(),
            response_time_ms: round_ms(start.elapsed()),
        },
    };

    with_connection_close(Json(body))
}

/// `GET /api/database-info`.
///
/// Always 200: an unreachable database is described in the body, not signalled
/// through the status code.
pub async fn database_info_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let store = &state.store;

    let start = Instant::now();
    let counted = store.count_people().await;
    let latency = start.elapsed();

    let (status, message, total_rows, db_latency_ms) = match counted {
        Ok(rows) => ("Operational", String::new(), rows, round_ms(latency)),
        Err(e) => {
            tracing::error!(request_id = %request_id(&headers), error = %e, "Database query failed");
            ("Offline", e.to_string(), 0, 0.0)
        }
    };

    let body = DatabaseInfo {
        database_type: store.kind(),
        status,
        message,
        total_rows,
        client_version: store.client_version(),
        db_latency_ms,
        db_host: store.host().unwrap_or_else(|| "Unknown".to_string()),
    };

    with_connection_close(Json(body))
}

/// The Docker host address when running in a container, else our hostname.
async fn server_identity() -> String {
    let lookup = tokio::net::lookup_host((DOCKER_HOST, 0));
    match tokio::time::timeout(HOST_LOOKUP_TIMEOUT, lookup).await {
        Ok(Ok(mut addrs)) => {
            if let Some(addr) = addrs.next() {
                return addr.ip().to_string();
            }
        }
        Ok(Err(e)) => tracing::trace!(error = %e, "Docker host lookup failed"),
        Err(_) => tracing::trace!("Docker host lookup timed out"),
    }
    hostname()
}

fn hostname() -> String {
    if let Some(name) = std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()) {
        return name;
    }
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Milliseconds with two decimals.
fn round_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn with_connection_close(body: impl IntoResponse) -> Response {
    ([(header::CONNECTION, HeaderValue::from_static("close"))], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_ms(Duration::from_micros(1234)), 1.23);
        assert_eq!(round_ms(Duration::from_micros(1235600)), 1235.6);
        assert_eq!(round_ms(Duration::ZERO), 0.0);
    }

    #[test]
    fn database_info_uses_camel_case() {
        let info = DatabaseInfo {
            database_type: "PostgreSQL",
            status: "Operational",
            message: String::new(),
            total_rows: 4,
            client_version: crate::store::postgres::DRIVER_VERSION,
            db_latency_ms: 1.5,
            db_host: "db".to_string(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["databaseType"], "PostgreSQL");
        assert_eq!(json["totalRows"], 4);
        assert_eq!(json["dbLatencyMs"], 1.5);
        assert_eq!(json["dbHost"], "db");
    }

    #[test]
    fn hostname_is_never_empty() {
        assert!(!hostname().is_empty());
    }
}
