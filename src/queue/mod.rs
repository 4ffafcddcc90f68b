//! Work queue collaborator.
//!
//! The queue holds ticket requests from the moment a producer submits them
//! until the remote worker reports an outcome. The long-poll core only asks
//! it two questions: "is anything pending" and "what is pending".
//!
//! Delivered items are *not* removed on delivery. They stay pending until a
//! [`CompletionReport`] arrives, so a worker that crashes mid-task sees the
//! item again on its next poll (at-least-once delivery).

use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{CompletedItem, CompletionReport, QueuedItem, TicketId, WorkItem};

pub mod memory;

pub use memory::MemoryWorkQueue;

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// No pending item carries this id.
    #[error("no pending ticket request with id {0}")]
    UnknownItem(TicketId),

    /// The id space is exhausted.
    #[error("ticket id space exhausted")]
    IdsExhausted,
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// A list of pending work items.
///
/// Implementations serialize their own access; every method takes `&self`.
pub trait WorkQueue: Send + Sync {
    /// Stores a new item and returns it with its assigned id.
    ///
    /// Ids are one greater than the largest id ever issued, starting at 1.
    fn enqueue(&self, fields: Map<String, Value>) -> Result<WorkItem>;

    /// Returns true if at least one item awaits completion.
    fn has_pending(&self) -> Result<bool>;

    /// Returns every pending item, oldest first.
    fn pending(&self) -> Result<Vec<WorkItem>>;

    /// Returns every pending item with its enqueue time, oldest first.
    fn pending_records(&self) -> Result<Vec<QueuedItem>>;

    /// Moves a pending item to the history with the reported outcome.
    fn complete(&self, report: CompletionReport) -> Result<CompletedItem>;

    /// Returns every completed item, oldest completion first.
    fn history(&self) -> Result<Vec<CompletedItem>>;
}
