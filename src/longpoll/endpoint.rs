//! One long-poll request, start to finish.
//!
//! 1. Compute the wait budget from the client's declared timeout.
//! 2. Fast path: anything already queued is returned at once as
//!    `initial_sync`.
//! 3. Otherwise register in the [`WaiterSlot`] and wait for a resolution or
//!    the end of the budget.
//! 4. Leave the slot (only if still the occupant) on every exit path.
//!
//! An item enqueued between steps 2 and 3 is not lost: the notifier finds
//! the freshly registered wait and resolves it.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::slot::{PendingWait, Resolution, WaitHandle, WaiterSlot};
use super::timeout::TimeoutPolicy;
use crate::queue::WorkQueue;
use crate::types::{WaitToken, WorkItem};

const FORCED_RECONNECT_MESSAGE: &str = "New poll initiated. Please re-poll immediately.";
const TIMEOUT_MESSAGE: &str = "No new events.";

/// Parameters a worker sends with each poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollRequest {
    /// The worker's own socket timeout, in seconds.
    pub client_timeout_s: Option<i64>,
    /// When the worker issued the request (ISO-8601).
    pub timestamp: Option<String>,
}

impl PollRequest {
    /// Extracts poll parameters from a request body.
    ///
    /// Never fails: an empty, non-JSON or oddly typed body yields whatever
    /// fields could be read, and the timeout policy fills in the rest.
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
            return PollRequest::default();
        };

        PollRequest {
            client_timeout_s: map.get("client_timeout_s").and_then(timeout_seconds),
            timestamp: map
                .get("timestamp")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }
}

fn timeout_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// What the worker receives. Always sent with HTTP 200; `status` tells the
/// outcomes apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollResponse {
    /// Work was already queued when the poll arrived.
    InitialSync { data: Vec<WorkItem> },
    /// A producer handed over an item while the poll was waiting.
    Success { data: WorkItem },
    /// A newer poll took over; reconnect immediately.
    ForcedReconnect { message: String },
    /// Nothing happened within the budget; reconnect immediately.
    Timeout { message: String },
}

impl PollResponse {
    /// True for outcomes after which the worker should simply poll again.
    pub fn is_reconnect(&self) -> bool {
        matches!(
            self,
            PollResponse::ForcedReconnect { .. } | PollResponse::Timeout { .. }
        )
    }
}

impl From<Resolution> for PollResponse {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Delivered(item) => PollResponse::Success { data: item },
            Resolution::ForcedReconnect => PollResponse::ForcedReconnect {
                message: FORCED_RECONNECT_MESSAGE.to_string(),
            },
            Resolution::TimedOut => PollResponse::Timeout {
                message: TIMEOUT_MESSAGE.to_string(),
            },
        }
    }
}

/// Leaves the slot when dropped, covering early returns and cancellation of
/// the request future (the worker hung up).
struct Registration<'a> {
    slot: &'a WaiterSlot,
    token: WaitToken,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.slot.clear_if_current(self.token) {
            debug!(token = %self.token, "Cleared poll registration");
        }
    }
}

/// Leaves the slot, then settles how the wait ended.
///
/// A delivery that raced the timer and won the lock before the clear is
/// still ours, so a timeout is only final once the handle is confirmed empty.
fn finish_wait(
    registration: Registration<'_>,
    handle: &mut WaitHandle,
    resolution: Resolution,
) -> Resolution {
    drop(registration);

    match resolution {
        Resolution::TimedOut => handle.try_take().unwrap_or(Resolution::TimedOut),
        resolution => resolution,
    }
}

/// Serves long-poll requests against a shared slot and queue.
#[derive(Clone)]
pub struct LongPoll {
    slot: Arc<WaiterSlot>,
    queue: Arc<dyn WorkQueue>,
    policy: TimeoutPolicy,
}

impl LongPoll {
    pub fn new(slot: Arc<WaiterSlot>, queue: Arc<dyn WorkQueue>, policy: TimeoutPolicy) -> Self {
        LongPoll {
            slot,
            queue,
            policy,
        }
    }

    /// Handles one poll.
    pub async fn poll(&self, request: &PollRequest) -> PollResponse {
        let budget = self
            .policy
            .wait_budget(request.client_timeout_s, request.timestamp.as_deref());

        debug!(
            client_timeout_s = ?request.client_timeout_s,
            timestamp = ?request.timestamp,
            budget_secs = budget.as_secs(),
            "Received poll"
        );

        match self.queue.pending() {
            Ok(items) if !items.is_empty() => {
                info!(count = items.len(), "Initial sync with queued work");
                return PollResponse::InitialSync { data: items };
            }
            Ok(_) => {}
            Err(e) => {
                // Still worth waiting: a notify delivers directly to the slot.
                warn!(error = %e, "Failed to read work queue");
            }
        }

        let (pending, mut handle) = PendingWait::channel();
        let token = handle.token();
        self.slot.register(pending);
        let registration = Registration {
            slot: &self.slot,
            token,
        };

        let first = handle.wait(budget).await;
        let resolution = finish_wait(registration, &mut handle, first);

        match &resolution {
            Resolution::Delivered(item) => debug!(token = %token, item_id = %item.id, "Poll delivered"),
            Resolution::ForcedReconnect => debug!(token = %token, "Poll displaced"),
            Resolution::TimedOut => debug!(token = %token, budget_secs = budget.as_secs(), "Poll timed out"),
        }

        resolution.into()
    }
}
