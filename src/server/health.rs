//! Health check endpoint for liveness probes.
//!
//! Answers without touching the waiter slot or the queue, so a worker parked
//! on `/poll_for_update` never delays it.

use axum::http::StatusCode;

/// Health check handler.
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: text/plain
///
/// OK
/// ```
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
