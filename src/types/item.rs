//! Work items and their completion records.
//!
//! A [`WorkItem`] is the opaque payload handed from the producer to the
//! remote worker. The relay only reads its id; every other field passes
//! through untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::TicketId;

/// A pending unit of work.
///
/// Serialized flat, so a ticket with id 7 looks like `{"id": 7, "name": ...}`
/// on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: TicketId,

    /// Producer-supplied fields. Never interpreted by the relay.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl WorkItem {
    /// Creates a work item, discarding any `id` key in `fields` so the
    /// queue-assigned id is the only one on the wire.
    pub fn new(id: TicketId, mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        WorkItem { id, fields }
    }
}

/// A work item sitting in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedItem {
    #[serde(flatten)]
    pub item: WorkItem,
    pub enqueued_at: DateTime<Utc>,
}

/// The worker's report on a delivered item.
///
/// Workers may also spell the fields `task_id` and `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    #[serde(alias = "task_id")]
    pub item_id: TicketId,

    #[serde(alias = "status")]
    pub outcome: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// A work item the worker has reported on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedItem {
    #[serde(flatten)]
    pub item: WorkItem,
    pub enqueued_at: DateTime<Utc>,
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fields;
    use serde_json::json;

    #[test]
    fn work_item_serializes_flat() {
        let item = WorkItem::new(TicketId(7), fields(json!({"train_no": "123", "name": "A"})));

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"id": 7, "train_no": "123", "name": "A"}));
    }

    #[test]
    fn work_item_new_drops_caller_supplied_id() {
        let item = WorkItem::new(TicketId(3), fields(json!({"id": 99, "name": "B"})));

        assert_eq!(item.id, TicketId(3));
        assert!(!item.fields.contains_key("id"));
        assert_eq!(serde_json::to_value(&item).unwrap()["id"], json!(3));
    }

    #[test]
    fn work_item_passes_nested_fields_through() {
        let payload = json!({"route": {"from": "Taipei", "to": "Zuoying"}, "seats": [1, 2]});
        let item = WorkItem::new(TicketId(1), fields(payload.clone()));

        let parsed: WorkItem = serde_json::from_value(serde_json::to_value(&item).unwrap()).unwrap();
        assert_eq!(parsed, item);
        assert_eq!(parsed.fields["route"], payload["route"]);
    }

    #[test]
    fn completion_report_accepts_worker_spelling() {
        let report: CompletionReport = serde_json::from_value(json!({
            "task_id": 4,
            "status": "booked",
            "details": {"code": "T0004A12"}
        }))
        .unwrap();

        assert_eq!(report.item_id, TicketId(4));
        assert_eq!(report.outcome, "booked");
        assert_eq!(report.details, Some(json!({"code": "T0004A12"})));
    }

    #[test]
    fn completion_report_details_optional() {
        let report: CompletionReport =
            serde_json::from_value(json!({"item_id": 5, "outcome": "failed"})).unwrap();

        assert_eq!(report.details, None);
    }

    #[test]
    fn completion_report_requires_outcome() {
        let result: Result<CompletionReport, _> = serde_json::from_value(json!({"item_id": 5}));
        assert!(result.is_err());
    }
}
