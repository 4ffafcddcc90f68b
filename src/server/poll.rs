//! Long-poll endpoint handler.
//!
//! The remote worker keeps exactly one request parked here. The handler never
//! fails: whatever the body looks like, the worker gets a 200 with a `status`
//! telling it what to do next.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use tracing::debug;

use super::AppState;
use crate::longpoll::{PollRequest, PollResponse};

/// Long-poll handler.
///
/// # Request
///
/// - Method: GET or POST
/// - Body (optional): `{"client_timeout_s": 605, "timestamp": "2025-03-01T12:00:00"}`
///
/// # Response
///
/// Always 200 OK with one of:
///
/// - `{"status": "initial_sync", "data": [...]}` - work was already queued
/// - `{"status": "success", "data": {...}}` - work arrived while waiting
/// - `{"status": "forced_reconnect", "message": "..."}` - a newer poll took over
/// - `{"status": "timeout", "message": "..."}` - nothing arrived in time
///
/// The worker should re-poll immediately after either of the last two.
pub async fn poll_handler(State(app_state): State<AppState>, body: Bytes) -> Json<PollResponse> {
    let request = PollRequest::from_body(&body);
    let response = app_state.long_poll().poll(&request).await;

    if response.is_reconnect() {
        debug!("Telling worker to re-poll");
    }
    Json(response)
}
