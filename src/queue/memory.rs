//! In-process work queue.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

use super::{QueueError, Result, WorkQueue};
use crate::types::{CompletedItem, CompletionReport, QueuedItem, TicketId, WorkItem};

/// A [`WorkQueue`] backed by process memory.
///
/// Contents do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryWorkQueue {
    inner: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: Vec<QueuedItem>,
    history: Vec<CompletedItem>,
    last_id: Option<TicketId>,
}

impl MemoryWorkQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        // Every critical section leaves the state consistent, so a panic
        // elsewhere while holding the lock does not invalidate it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkQueue for MemoryWorkQueue {
    fn enqueue(&self, fields: Map<String, Value>) -> Result<WorkItem> {
        let mut state = self.state();

        let id = match state.last_id {
            None => TicketId(1),
            Some(TicketId(u64::MAX)) => return Err(QueueError::IdsExhausted),
            Some(last) => last.next(),
        };

        let item = WorkItem::new(id, fields);
        state.pending.push(QueuedItem {
            item: item.clone(),
            enqueued_at: Utc::now(),
        });
        state.last_id = Some(id);

        debug!(item_id = %id, pending = state.pending.len(), "Enqueued ticket request");
        Ok(item)
    }

    fn has_pending(&self) -> Result<bool> {
        Ok(!self.state().pending.is_empty())
    }

    fn pending(&self) -> Result<Vec<WorkItem>> {
        Ok(self
            .state()
            .pending
            .iter()
            .map(|queued| queued.item.clone())
            .collect())
    }

    fn pending_records(&self) -> Result<Vec<QueuedItem>> {
        Ok(self.state().pending.clone())
    }

    fn complete(&self, report: CompletionReport) -> Result<CompletedItem> {
        let mut state = self.state();

        let position = state
            .pending
            .iter()
            .position(|queued| queued.item.id == report.item_id)
            .ok_or(QueueError::UnknownItem(report.item_id))?;

        let queued = state.pending.remove(position);
        let completed = CompletedItem {
            item: queued.item,
            enqueued_at: queued.enqueued_at,
            outcome: report.outcome,
            details: report.details,
            completed_at: Utc::now(),
        };
        state.history.push(completed.clone());

        debug!(
            item_id = %completed.item.id,
            outcome = %completed.outcome,
            "Completed ticket request"
        );
        Ok(completed)
    }

    fn history(&self) -> Result<Vec<CompletedItem>> {
        Ok(self.state().history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fields;
    use serde_json::json;

    fn report(id: u64, outcome: &str) -> CompletionReport {
        CompletionReport {
            item_id: TicketId(id),
            outcome: outcome.to_string(),
            details: None,
        }
    }

    #[test]
    fn new_queue_is_empty() {
        let queue = MemoryWorkQueue::new();

        assert!(!queue.has_pending().unwrap());
        assert!(queue.pending().unwrap().is_empty());
        assert!(queue.history().unwrap().is_empty());
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let queue = MemoryWorkQueue::new();

        let a = queue.enqueue(fields(json!({"name": "a"}))).unwrap();
        let b = queue.enqueue(fields(json!({"name": "b"}))).unwrap();

        assert_eq!(a.id, TicketId(1));
        assert_eq!(b.id, TicketId(2));
    }

    #[test]
    fn ids_are_not_reused_after_completion() {
        let queue = MemoryWorkQueue::new();
        queue.enqueue(Map::new()).unwrap();
        queue.enqueue(Map::new()).unwrap();
        queue.complete(report(2, "booked")).unwrap();

        let next = queue.enqueue(Map::new()).unwrap();
        assert_eq!(next.id, TicketId(3));
    }

    #[test]
    fn pending_preserves_order_and_fields() {
        let queue = MemoryWorkQueue::new();
        queue.enqueue(fields(json!({"train_no": "111"}))).unwrap();
        queue.enqueue(fields(json!({"train_no": "222"}))).unwrap();

        let pending = queue.pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].fields["train_no"], json!("111"));
        assert_eq!(pending[1].fields["train_no"], json!("222"));
        assert!(queue.has_pending().unwrap());
    }

    #[test]
    fn complete_moves_item_to_history() {
        let queue = MemoryWorkQueue::new();
        queue.enqueue(fields(json!({"name": "a"}))).unwrap();
        queue.enqueue(fields(json!({"name": "b"}))).unwrap();

        let completed = queue
            .complete(CompletionReport {
                item_id: TicketId(1),
                outcome: "booked".to_string(),
                details: Some(json!({"code": "T0001A42"})),
            })
            .unwrap();

        assert_eq!(completed.item.id, TicketId(1));
        assert_eq!(completed.outcome, "booked");
        assert!(completed.completed_at >= completed.enqueued_at);

        let pending = queue.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, TicketId(2));

        let history = queue.history().unwrap();
        assert_eq!(history, vec![completed]);
    }

    #[test]
    fn complete_unknown_id_fails() {
        let queue = MemoryWorkQueue::new();
        queue.enqueue(Map::new()).unwrap();

        let result = queue.complete(report(42, "booked"));
        assert!(matches!(result, Err(QueueError::UnknownItem(TicketId(42)))));
        assert!(queue.has_pending().unwrap());
    }

    #[test]
    fn complete_twice_fails_the_second_time() {
        let queue = MemoryWorkQueue::new();
        queue.enqueue(Map::new()).unwrap();

        queue.complete(report(1, "failed")).unwrap();
        let second = queue.complete(report(1, "booked"));

        assert!(matches!(second, Err(QueueError::UnknownItem(TicketId(1)))));
        assert_eq!(queue.history().unwrap().len(), 1);
    }

    #[test]
    fn pending_records_carry_enqueue_time() {
        let queue = MemoryWorkQueue::new();
        let before = Utc::now();
        queue.enqueue(Map::new()).unwrap();

        let records = queue.pending_records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].enqueued_at >= before);
    }
}
