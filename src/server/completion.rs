//! Completion endpoint handler.
//!
//! The worker reports what happened to a delivered ticket request. The report
//! is handed to the work queue, which removes the item from the pending list
//! and records it in the history.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::AppState;
use crate::queue::QueueError;
use crate::types::{CompletionReport, TicketId};

/// Errors that can occur when recording a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Body is not a valid completion report.
    #[error("invalid completion report: {0}")]
    InvalidReport(#[from] serde_json::Error),

    /// Queue error (including an unknown item id).
    #[error("{0}")]
    Queue(#[from] QueueError),
}

impl IntoResponse for CompletionError {
    fn into_response(self) -> Response {
        match self {
            CompletionError::InvalidReport(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            CompletionError::Queue(e) => e.into_response(),
        }
    }
}

/// Body of a successful completion.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub status: &'static str,
    pub item_id: TicketId,
}

/// Completion handler.
///
/// # Request
///
/// `{"item_id": 7, "outcome": "booked", "details": {...}}`; the worker's
/// `task_id` / `status` spelling is also accepted.
///
/// # Response
///
/// - 200 OK: `{"status": "updated", "item_id": 7}`
/// - 400 Bad Request: malformed report
/// - 404 Not Found: no pending item with that id
pub async fn completion_handler(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<CompletionResponse>, CompletionError> {
    let report: CompletionReport = serde_json::from_slice(&body).inspect_err(|e| {
        warn!(error = %e, "Rejected malformed completion report");
    })?;
    let item_id = report.item_id;

    let completed = app_state.queue().complete(report).inspect_err(|e| {
        warn!(item_id = %item_id, error = %e, "Completion for unknown ticket request");
    })?;

    info!(
        item_id = %item_id,
        outcome = %completed.outcome,
        "Ticket request completed"
    );

    Ok(Json(CompletionResponse {
        status: "updated",
        item_id,
    }))
}
