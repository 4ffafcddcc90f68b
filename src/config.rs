//! Runtime configuration.
//!
//! Every setting has a default and may be overridden from the environment.
//! Unparseable values fall back to the default rather than aborting startup.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `RELAY_PORT` | 10000 |
//! | `RELAY_SAFETY_MARGIN_SECS` | 5 |
//! | `RELAY_MIN_CLIENT_TIMEOUT_SECS` | 10 |
//! | `RELAY_DEFAULT_CLIENT_TIMEOUT_SECS` | 300 |
//! | `RELAY_UPSTREAM_TIMEOUT_SECS` | 300 |
//! | `RELAY_CLIENT_UTC_OFFSET_MINUTES` | unset (server local time) |

use std::net::SocketAddr;
use std::str::FromStr;

use chrono::FixedOffset;

use crate::longpoll::timeout::MIN_SAFETY_MARGIN_SECS;
use crate::longpoll::{ClientClock, TimeoutPolicy};

/// Default listening port.
const DEFAULT_PORT: u16 = 10000;

/// Configuration for the relay server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,

    /// How long polls may be held open.
    pub timeouts: TimeoutPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayConfig {
    /// Creates a `RelayConfig` with default values.
    pub fn new() -> Self {
        RelayConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            timeouts: TimeoutPolicy::new(),
        }
    }

    /// Creates a `RelayConfig` from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a `RelayConfig` from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::new();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let port = lookup("RELAY_PORT")
            .and_then(|v| u16::from_str(v.trim()).ok())
            .unwrap_or(DEFAULT_PORT);

        let client_clock = lookup("RELAY_CLIENT_UTC_OFFSET_MINUTES")
            .and_then(|v| v.trim().parse::<i32>().ok())
            .and_then(|minutes| minutes.checked_mul(60))
            .and_then(FixedOffset::east_opt)
            .map_or(ClientClock::Local, ClientClock::Fixed);

        let t = defaults.timeouts;
        RelayConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            timeouts: TimeoutPolicy {
                safety_margin_secs: parsed("RELAY_SAFETY_MARGIN_SECS")
                    .unwrap_or(t.safety_margin_secs)
                    .max(MIN_SAFETY_MARGIN_SECS),
                min_client_timeout_secs: parsed("RELAY_MIN_CLIENT_TIMEOUT_SECS")
                    .unwrap_or(t.min_client_timeout_secs),
                default_client_timeout_secs: parsed("RELAY_DEFAULT_CLIENT_TIMEOUT_SECS")
                    .unwrap_or(t.default_client_timeout_secs),
                upstream_limit_secs: parsed("RELAY_UPSTREAM_TIMEOUT_SECS")
                    .unwrap_or(t.upstream_limit_secs),
                client_clock,
            },
        }
    }
}
