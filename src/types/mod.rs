//! Core domain types for the ticket relay.
//!
//! Identifiers and the opaque work items that flow from producers, through the
//! queue and the long-poll handoff, to the remote worker.

pub mod ids;
pub mod item;

pub use ids::{TicketId, WaitToken};
pub use item::{CompletedItem, CompletionReport, QueuedItem, WorkItem};
