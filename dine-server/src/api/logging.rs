//! Request logging middleware

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use super::REQUEST_ID_HEADER;

/// One line per finished request: id, method, matched route, status, latency.
/// Matched paths keep ids out of the route field (`/api/orders/{id}`).
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(%request_id, %method, %route, status = status.as_u16(), latency_ms, "Request failed");
    } else if status.is_client_error() {
        info!(%request_id, %method, %route, status = status.as_u16(), latency_ms, "Request rejected");
    } else {
        info!(%request_id, %method, %route, status = status.as_u16(), latency_ms, "Request completed");
    }

    response
}
