//! HTTP server for the ticket relay.
//!
//! This module implements the HTTP server that:
//! - Parks the remote worker's long-poll request until work arrives
//! - Accepts new ticket requests and wakes the worker instantly
//! - Records the worker's outcome for each delivered ticket
//! - Provides inspection and health endpoints
//!
//! # Endpoints
//!
//! - `GET|POST /poll_for_update` - Long poll (always 200; see [`PollResponse`])
//! - `POST /trigger_event`, `POST /api/ticket_requests` - Enqueue a ticket request
//! - `GET /api/ticket_requests` - Pending ticket requests
//! - `POST /update_status` - Worker reports an outcome
//! - `GET /api/ticket_history` - Completed ticket requests
//! - `GET /api/v1/waiter` - Whether a worker is currently waiting
//! - `GET /health` - Returns 200 if server is running
//!
//! [`PollResponse`]: crate::longpoll::PollResponse

use std::sync::Arc;

use crate::longpoll::{LongPoll, Notifier, TimeoutPolicy, WaiterSlot};
use crate::queue::WorkQueue;

pub mod completion;
pub mod health;
pub mod poll;
pub mod tickets;
pub mod trigger;
pub mod waiter;

pub use completion::completion_handler;
pub use health::health_handler;
pub use poll::poll_handler;
pub use tickets::{history_handler, pending_handler};
pub use trigger::trigger_handler;
pub use waiter::waiter_handler;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. It owns the
/// single [`WaiterSlot`]; every poll and every notification goes through it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    slot: Arc<WaiterSlot>,
    queue: Arc<dyn WorkQueue>,
    long_poll: LongPoll,
    notifier: Notifier,
}

impl AppState {
    /// Creates a new `AppState` around a work queue.
    ///
    /// # Arguments
    ///
    /// * `queue` - Where ticket requests wait until the worker completes them
    /// * `policy` - How long polls may be held open
    pub fn new(queue: Arc<dyn WorkQueue>, policy: TimeoutPolicy) -> Self {
        let slot = Arc::new(WaiterSlot::new());
        AppState {
            inner: Arc::new(AppStateInner {
                long_poll: LongPoll::new(slot.clone(), queue.clone(), policy),
                notifier: Notifier::new(slot.clone(), queue.clone()),
                slot,
                queue,
            }),
        }
    }

    /// Returns the waiter slot.
    pub fn slot(&self) -> &WaiterSlot {
        &self.inner.slot
    }

    /// Returns the work queue.
    pub fn queue(&self) -> &dyn WorkQueue {
        self.inner.queue.as_ref()
    }

    /// Returns the long-poll endpoint.
    pub fn long_poll(&self) -> &LongPoll {
        &self.inner.long_poll
    }

    /// Returns the notifier.
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/poll_for_update", get(poll_handler).post(poll_handler))
        .route("/trigger_event", post(trigger_handler))
        .route(
            "/api/ticket_requests",
            get(pending_handler).post(trigger_handler),
        )
        .route("/update_status", post(completion_handler))
        .route("/api/ticket_history", get(history_handler))
        .route("/api/v1/waiter", get(waiter_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryWorkQueue;
    use crate::test_utils::fields;
    use serde_json::json;

    #[test]
    fn app_state_accessors_work() {
        let state = AppState::new(Arc::new(MemoryWorkQueue::new()), TimeoutPolicy::new());

        assert!(!state.slot().is_occupied());
        assert!(!state.queue().has_pending().unwrap());
    }

    #[test]
    fn app_state_clones_share_queue_and_slot() {
        let state = AppState::new(Arc::new(MemoryWorkQueue::new()), TimeoutPolicy::new());
        let cloned = state.clone();

        cloned.notifier().notify(fields(json!({"name": "A"}))).unwrap();

        assert!(state.queue().has_pending().unwrap());
        assert!(std::ptr::eq(state.slot(), cloned.slot()));
    }
}
