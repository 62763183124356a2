//! Audit logging middleware.
//!
//! Logs every API request with user, method, path, status and latency.
//! Runs inside the auth layer, so `UserContext` is present for protected
//! routes.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::UserContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user = req
        .extensions()
        .get::<UserContext>()
        .map(|u| u.username.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let started = Instant::now();
    let response = next.run(req).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        tracing::warn!(%user, %method, %path, status, elapsed_ms, "API access");
    } else {
        tracing::info!(%user, %method, %path, status, elapsed_ms, "API access");
    }

    response
}
