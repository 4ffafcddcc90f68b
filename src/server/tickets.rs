//! Read-only views of the work queue.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::AppState;
use crate::queue::QueueError;
use crate::types::{CompletedItem, QueuedItem};

impl IntoResponse for QueueError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueueError::UnknownItem(_) => StatusCode::NOT_FOUND,
            QueueError::IdsExhausted => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

/// Pending ticket requests, oldest first.
///
/// This is what the next poll's fast path would hand to the worker.
pub async fn pending_handler(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<QueuedItem>>, QueueError> {
    Ok(Json(app_state.queue().pending_records()?))
}

/// Completed ticket requests with the worker's reported outcome.
pub async fn history_handler(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<CompletedItem>>, QueueError> {
    Ok(Json(app_state.queue().history()?))
}
