//! Waiter inspection endpoint for observability.
//!
//! Shows whether the remote worker is currently parked on a poll, which is
//! the quickest way to tell "worker offline" from "no work".

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;
use crate::queue::QueueError;
use crate::types::WaitToken;

/// Snapshot of the waiter slot and queue depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaiterStatus {
    /// A poll is parked right now.
    pub waiting: bool,
    /// Token of the parked poll.
    pub token: Option<WaitToken>,
    /// Ticket requests awaiting completion.
    pub pending: usize,
}

/// Waiter inspection handler.
///
/// ```ignore
/// GET /api/v1/waiter HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {"waiting": true, "token": 42, "pending": 0}
/// ```
pub async fn waiter_handler(
    State(app_state): State<AppState>,
) -> Result<Json<WaiterStatus>, QueueError> {
    let token = app_state.slot().current_token();
    let pending = app_state.queue().pending()?.len();

    Ok(Json(WaiterStatus {
        waiting: token.is_some(),
        token,
        pending,
    }))
}
