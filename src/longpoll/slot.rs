//! Single-occupant registry for the blocked long-poll call.
//!
//! At most one worker connection may be parked at a time. A newer poll
//! displaces the older one with [`Resolution::ForcedReconnect`] instead of
//! dropping it, so an overlapping or retried connection never leaves a
//! dangling request on the server.
//!
//! # Protocol
//!
//! ```text
//! endpoint                         slot                       notifier
//!    |  register(pending) ------->  |  (old -> ForcedReconnect)
//!    |  handle.wait(budget)         |
//!    |                              |  <------- resolve_current(item)
//!    |  <--- Delivered(item) ------ |
//!    |  clear_if_current(token) --> |  (no-op if displaced)
//! ```
//!
//! Every operation runs under one mutex and performs only state transitions:
//! taking or replacing the occupant and firing its oneshot sender. Waiting
//! happens on the [`WaitHandle`], outside the lock.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::types::{WaitToken, WorkItem};

/// How a long-poll wait ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A producer handed this item to the waiter.
    Delivered(WorkItem),
    /// A newer poll (or shutdown) took the slot.
    ForcedReconnect,
    /// The wait budget ran out.
    TimedOut,
}

/// The registered half of a wait, held by the [`WaiterSlot`].
#[derive(Debug)]
pub struct PendingWait {
    token: WaitToken,
    signal: oneshot::Sender<Resolution>,
}

/// The owning half of a wait, held by the long-poll call that created it.
#[derive(Debug)]
pub struct WaitHandle {
    token: WaitToken,
    /// `None` once a resolution has been taken; nothing can follow it.
    signal: Option<oneshot::Receiver<Resolution>>,
}

impl PendingWait {
    /// Creates a linked pending wait and handle sharing a fresh token.
    pub fn channel() -> (PendingWait, WaitHandle) {
        let token = WaitToken::fresh();
        let (tx, rx) = oneshot::channel();
        (
            PendingWait { token, signal: tx },
            WaitHandle {
                token,
                signal: Some(rx),
            },
        )
    }

    pub fn token(&self) -> WaitToken {
        self.token
    }

    /// Fires the signal. Returns false if the handle is already gone.
    fn resolve(self, resolution: Resolution) -> bool {
        self.signal.send(resolution).is_ok()
    }
}

impl WaitHandle {
    pub fn token(&self) -> WaitToken {
        self.token
    }

    /// Waits up to `budget` for the wait to be resolved.
    ///
    /// A pending wait dropped without firing (the slot itself went away) is
    /// reported as [`Resolution::ForcedReconnect`], since the caller can do
    /// nothing better than reconnect. So is waiting again after a resolution
    /// was already taken.
    pub async fn wait(&mut self, budget: Duration) -> Resolution {
        let Some(signal) = self.signal.as_mut() else {
            return Resolution::ForcedReconnect;
        };

        let resolution = match tokio::time::timeout(budget, signal).await {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(_)) => Resolution::ForcedReconnect,
            Err(_) => return Resolution::TimedOut,
        };
        self.signal = None;
        resolution
    }

    /// Returns a resolution that has already fired, without waiting.
    pub fn try_take(&mut self) -> Option<Resolution> {
        let resolution = self.signal.as_mut()?.try_recv().ok()?;
        self.signal = None;
        Some(resolution)
    }
}

/// Holds at most one [`PendingWait`].
#[derive(Debug, Default)]
pub struct WaiterSlot {
    state: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    occupant: Option<PendingWait>,
    /// Set on shutdown. Later registrations are turned away at once.
    closed: bool,
}

impl WaiterSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // Critical sections never leave a torn state, so poisoning is benign.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `wait` the current occupant.
    ///
    /// A previous occupant is resolved with [`Resolution::ForcedReconnect`]
    /// before it is replaced. Returns the displaced token, if any.
    ///
    /// After [`close`](Self::close), `wait` is resolved with
    /// [`Resolution::ForcedReconnect`] instead of being stored.
    pub fn register(&self, wait: PendingWait) -> Option<WaitToken> {
        let token = wait.token;
        let displaced = {
            let mut state = self.lock();
            if state.closed {
                wait.resolve(Resolution::ForcedReconnect);
                drop(state);
                debug!(token = %token, "Turned away poll during shutdown");
                return None;
            }
            state.occupant.replace(wait).map(|old| {
                let old_token = old.token;
                old.resolve(Resolution::ForcedReconnect);
                old_token
            })
        };

        match displaced {
            Some(old) => info!(token = %token, displaced = %old, "Forced reconnect of previous poll"),
            None => debug!(token = %token, "Registered poll"),
        }
        displaced
    }

    /// Hands `item` to the current occupant, if there is one still listening.
    ///
    /// The occupant is removed either way, so a second call cannot fire the
    /// same wait twice. Returns true if the item reached a live waiter.
    pub fn resolve_current(&self, item: WorkItem) -> bool {
        let item_id = item.id;
        let (token, delivered) = {
            let mut state = self.lock();
            match state.occupant.take() {
                Some(wait) => {
                    let token = wait.token;
                    (Some(token), wait.resolve(Resolution::Delivered(item)))
                }
                None => (None, false),
            }
        };

        match (token, delivered) {
            (Some(token), true) => info!(token = %token, item_id = %item_id, "Delivered to waiting poll"),
            (Some(token), false) => {
                debug!(token = %token, item_id = %item_id, "Waiting poll already gone")
            }
            (None, _) => debug!(item_id = %item_id, "No poll waiting"),
        }
        delivered
    }

    /// Clears the slot if `token` is still the current occupant.
    ///
    /// A displaced call cleaning up after a newer one registered finds a
    /// different token and leaves the slot alone. Returns true if cleared.
    pub fn clear_if_current(&self, token: WaitToken) -> bool {
        let mut state = self.lock();
        if state.occupant.as_ref().is_some_and(|wait| wait.token == token) {
            state.occupant = None;
            true
        } else {
            false
        }
    }

    /// Resolves the current occupant with [`Resolution::ForcedReconnect`]
    /// without registering a replacement.
    pub fn evict(&self) -> Option<WaitToken> {
        let evicted = self.lock().occupant.take().map(|wait| {
            let token = wait.token;
            wait.resolve(Resolution::ForcedReconnect);
            token
        });

        if let Some(token) = evicted {
            info!(token = %token, "Evicted waiting poll");
        }
        evicted
    }

    /// Evicts the current occupant and turns away every later registration.
    pub fn close(&self) -> Option<WaitToken> {
        self.lock().closed = true;
        self.evict()
    }

    /// Token of the current occupant.
    pub fn current_token(&self) -> Option<WaitToken> {
        self.lock().occupant.as_ref().map(PendingWait::token)
    }

    pub fn is_occupied(&self) -> bool {
        self.lock().occupant.is_some()
    }
}
