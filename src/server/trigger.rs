//! Enqueue endpoint handler.
//!
//! Accepts a new ticket request, stores it in the work queue and wakes the
//! waiting worker, if there is one. Never blocks on the worker.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::AppState;
use crate::queue::QueueError;
use crate::types::TicketId;

/// Errors that can occur when enqueueing a ticket request.
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// Invalid JSON body.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The body is valid JSON but not an object.
    #[error("ticket request must be a JSON object")]
    NotAnObject,

    /// Queue error.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

impl IntoResponse for EnqueueError {
    fn into_response(self) -> Response {
        let status = match &self {
            EnqueueError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            EnqueueError::NotAnObject => StatusCode::BAD_REQUEST,
            EnqueueError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

/// Body of a successful enqueue.
#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub status: &'static str,
    pub item_id: TicketId,
    pub notifications_sent: u32,
}

/// Enqueue handler.
///
/// # Response
///
/// - 200 OK: `{"status": "event_received", "item_id": 7, "notifications_sent": 1}`
/// - 400 Bad Request: body is not a JSON object
/// - 500 Internal Server Error: queue failure
///
/// # Example
///
/// ```ignore
/// POST /trigger_event HTTP/1.1
/// Content-Type: application/json
///
/// {"name": "...", "train_no": "123", "travel_date": "2025-03-01"}
///
/// HTTP/1.1 200 OK
///
/// {"status": "event_received", "item_id": 7, "notifications_sent": 1}
/// ```
pub async fn trigger_handler(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<EnqueueResponse>, EnqueueError> {
    let body_json: Value = serde_json::from_slice(&body).inspect_err(|e| {
        warn!(error = %e, "Rejected ticket request with invalid JSON");
    })?;

    let Value::Object(fields) = body_json else {
        warn!("Rejected ticket request that is not a JSON object");
        return Err(EnqueueError::NotAnObject);
    };

    let notification = app_state.notifier().notify(fields)?;

    Ok(Json(EnqueueResponse {
        status: "event_received",
        item_id: notification.item.id,
        notifications_sent: notification.notifications_sent(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_errors_map_to_status_codes() {
        let invalid = serde_json::from_str::<Value>("{").unwrap_err();

        assert_eq!(
            EnqueueError::InvalidJson(invalid).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EnqueueError::NotAnObject.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            EnqueueError::Queue(QueueError::IdsExhausted)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn enqueue_response_shape() {
        let response = EnqueueResponse {
            status: "event_received",
            item_id: TicketId(3),
            notifications_sent: 0,
        };

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            serde_json::json!({"status": "event_received", "item_id": 3, "notifications_sent": 0})
        );
    }
}
