//! Ticket Relay - hands pending ticket requests to a single remote worker over HTTP long-poll.
//!
//! This library provides the long-poll handoff core (wait budget, waiter slot,
//! endpoint, notifier), the work queue it reads from, and the axum server that
//! exposes them.

pub mod config;
pub mod longpoll;
pub mod queue;
pub mod server;
pub mod types;

#[cfg(test)]
mod test_utils;
