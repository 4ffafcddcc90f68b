//! Wait budget calculation for long-poll requests.
//!
//! The worker opens each poll with its own socket timeout (`client_timeout_s`)
//! and, optionally, the instant it issued the request. The server must answer
//! strictly before that socket timeout fires, and strictly before any upstream
//! limit (gunicorn's `--timeout`, a reverse proxy) cuts the connection.
//!
//! # Formula
//!
//! Without a start time: `declared - safety_margin`.
//!
//! With a start time: `(start + declared - safety_margin) - now`, so time the
//! request spent in transit or queued behind the proxy is not waited twice.
//!
//! Both are clamped to `[0, min(declared, upstream_limit) - safety_margin]`.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};

/// Default seconds subtracted from every declared deadline.
pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 5;

/// Smallest safety margin applied, whatever is configured. A zero margin
/// would let the answer land exactly on the client's deadline.
pub const MIN_SAFETY_MARGIN_SECS: u64 = 1;

/// Default smallest client timeout the server will trust.
pub const DEFAULT_MIN_CLIENT_TIMEOUT_SECS: u64 = 10;

/// Default client timeout used when the declared one is missing or too small.
pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 300;

/// Default upstream request-timeout limit (gunicorn `--timeout 300`).
pub const DEFAULT_UPSTREAM_LIMIT_SECS: u64 = 300;

/// How to read a start timestamp that carries no UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientClock {
    /// The server's local timezone.
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

/// Parameters for [`TimeoutPolicy::compute_wait_seconds`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub safety_margin_secs: u64,
    pub min_client_timeout_secs: u64,
    pub default_client_timeout_secs: u64,
    pub upstream_limit_secs: u64,
    pub client_clock: ClientClock,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeoutPolicy {
    /// Creates a policy with default values.
    pub fn new() -> Self {
        TimeoutPolicy {
            safety_margin_secs: DEFAULT_SAFETY_MARGIN_SECS,
            min_client_timeout_secs: DEFAULT_MIN_CLIENT_TIMEOUT_SECS,
            default_client_timeout_secs: DEFAULT_CLIENT_TIMEOUT_SECS,
            upstream_limit_secs: DEFAULT_UPSTREAM_LIMIT_SECS,
            client_clock: ClientClock::Local,
        }
    }

    /// Returns how many whole seconds the server may hold this poll open.
    ///
    /// `declared` is the client's socket timeout; `None`, negative, or below
    /// the configured minimum all fall back to the default base timeout.
    /// `start` is the client's request time as ISO-8601; if it cannot be
    /// parsed the start-time adjustment is skipped.
    pub fn compute_wait_seconds(
        &self,
        declared: Option<i64>,
        start: Option<&str>,
        now: DateTime<Utc>,
    ) -> u64 {
        let timeout = self.effective_client_timeout(declared);
        let ceiling = self.ceiling(timeout);

        let Some(start) = start.and_then(|s| self.parse_start(s)) else {
            return ceiling;
        };

        let target_end = i64::try_from(timeout.saturating_sub(self.margin()))
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| start.checked_add_signed(delta));

        let Some(target_end) = target_end else {
            return ceiling;
        };

        let remaining = (target_end - now).num_seconds();
        if remaining <= 0 {
            0
        } else {
            // A client clock running ahead of ours must not stretch the wait.
            (remaining as u64).min(ceiling)
        }
    }

    /// [`compute_wait_seconds`](Self::compute_wait_seconds) against the
    /// current time, as a `Duration`.
    pub fn wait_budget(&self, declared: Option<i64>, start: Option<&str>) -> Duration {
        Duration::from_secs(self.compute_wait_seconds(declared, start, Utc::now()))
    }

    /// The client timeout the server will honour.
    pub fn effective_client_timeout(&self, declared: Option<i64>) -> u64 {
        match declared.and_then(|d| u64::try_from(d).ok()) {
            Some(d) if d >= self.min_client_timeout_secs => d,
            _ => self.default_client_timeout_secs,
        }
    }

    /// Upper bound on the budget for a given client timeout.
    fn ceiling(&self, timeout: u64) -> u64 {
        let client_bound = timeout.saturating_sub(self.margin());
        let upstream_bound = self.upstream_limit_secs.saturating_sub(self.margin());
        client_bound.min(upstream_bound)
    }

    fn margin(&self) -> u64 {
        self.safety_margin_secs.max(MIN_SAFETY_MARGIN_SECS)
    }

    /// Parses a client start time.
    ///
    /// RFC 3339 strings carry their own offset. Naive strings such as Python's
    /// `datetime.now().isoformat()` are read in [`ClientClock`].
    pub fn parse_start(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        let naive = s
            .parse::<NaiveDateTime>()
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()?;

        match self.client_clock {
            ClientClock::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            ClientClock::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
