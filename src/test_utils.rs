//! Shared test utilities and arbitrary generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::types::{TicketId, WorkItem};

/// Unwraps a `json!` object literal into its field map.
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// A work item with the given id and no other fields.
pub fn bare_item(id: u64) -> WorkItem {
    WorkItem::new(TicketId(id), Map::new())
}

pub fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::String),
    ]
}

/// Ticket-request-like payloads: a handful of string keys with scalar values.
pub fn arb_fields() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z_]{1,12}", arb_scalar(), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}
