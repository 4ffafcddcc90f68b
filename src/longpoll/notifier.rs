//! Producer-side entry point: store new work and wake the waiting worker.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use super::slot::WaiterSlot;
use crate::queue::{self, WorkQueue};
use crate::types::WorkItem;

/// The result of [`Notifier::notify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// The item as stored, with its assigned id.
    pub item: WorkItem,
    /// Whether a waiting poll received the item directly.
    pub delivered: bool,
}

impl Notification {
    /// 1 if a waiting poll was woken, 0 otherwise.
    pub fn notifications_sent(&self) -> u32 {
        u32::from(self.delivered)
    }
}

/// Enqueues work and resolves the current waiter, if any.
#[derive(Clone)]
pub struct Notifier {
    slot: Arc<WaiterSlot>,
    queue: Arc<dyn WorkQueue>,
}

impl Notifier {
    pub fn new(slot: Arc<WaiterSlot>, queue: Arc<dyn WorkQueue>) -> Self {
        Notifier { slot, queue }
    }

    /// Appends a new item to the queue, then hands it to the waiting poll.
    ///
    /// With no poll waiting the item simply stays queued; the next poll's
    /// fast path returns it. Never blocks.
    pub fn notify(&self, fields: Map<String, Value>) -> queue::Result<Notification> {
        let item = self.queue.enqueue(fields)?;
        let delivered = self.slot.resolve_current(item.clone());

        info!(
            item_id = %item.id,
            notifications_sent = u32::from(delivered),
            "New ticket request"
        );

        Ok(Notification { item, delivered })
    }
}
