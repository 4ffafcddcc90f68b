//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of the queue-assigned ticket id with
//! the per-call wait token, and make the code more self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier assigned to a ticket request when it enters the work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl TicketId {
    /// The id after this one.
    pub fn next(self) -> Self {
        TicketId(self.0.saturating_add(1))
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique token identifying one blocked long-poll call.
///
/// Tokens are never reused within a process, so comparing tokens is an
/// identity comparison between waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitToken(pub u64);

static NEXT_WAIT_TOKEN: AtomicU64 = AtomicU64::new(1);

impl WaitToken {
    /// Allocates a fresh, process-unique token.
    pub fn fresh() -> Self {
        WaitToken(NEXT_WAIT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WaitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}
