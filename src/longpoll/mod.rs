//! Long-poll handoff between producers and the single remote worker.
//!
//! The worker keeps one HTTP request parked on the server. When a producer
//! submits work, the [`Notifier`] resolves that request instantly; otherwise
//! it ends after a bounded wait and the worker reconnects.
//!
//! # Module Structure
//!
//! - [`timeout`]: how long a poll may be held open
//! - [`slot`]: the single-occupant waiter registry
//! - [`endpoint`]: one poll request, fast path included
//! - [`notifier`]: the producer side

pub mod endpoint;
pub mod notifier;
pub mod slot;
pub mod timeout;

pub use endpoint::{LongPoll, PollRequest, PollResponse};
pub use notifier::{Notification, Notifier};
pub use slot::{PendingWait, Resolution, WaitHandle, WaiterSlot};
pub use timeout::{ClientClock, TimeoutPolicy};
