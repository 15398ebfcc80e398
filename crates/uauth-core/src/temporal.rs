//! # Temporal Types: Epoch Milliseconds and Injectable Clocks
//!
//! Token timestamps are integer milliseconds since the Unix epoch, the unit
//! the wire format carries. `EpochMillis` wraps that integer; `Clock` is the
//! single source of "now" for issuance and expiry checks.
//!
//! ## Clock Skew
//!
//! Issuer and verifier each read their own clock. Nothing here synchronizes
//! them: a verifier running behind the issuer sees tokens live longer, one
//! running ahead sees them expire early. Verifiers that need tolerance apply
//! an explicit leeway on top of the clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochMillis(i64);

impl EpochMillis {
    /// Wrap a raw millisecond count.
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// The raw millisecond count.
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Add a duration, saturating at `i64::MAX`.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(ms))
    }

    /// Subtract a duration, saturating at `i64::MIN`.
    pub fn saturating_sub(self, duration: Duration) -> Self {
        let ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_sub(ms))
    }

    /// Render as RFC 3339 with millisecond precision and `Z` suffix, or the
    /// raw number when it is outside chrono's range.
    pub fn to_rfc3339(&self) -> String {
        match DateTime::<Utc>::from_timestamp_millis(self.0) {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => self.0.to_string(),
        }
    }
}

impl std::fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now(&self) -> EpochMillis;
}

/// The host's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochMillis {
        EpochMillis(Utc::now().timestamp_millis())
    }
}

/// A clock that only moves when told to. Used by tests and by callers that
/// replay recorded tokens.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Start the clock at the given instant.
    pub fn new(start: EpochMillis) -> Self {
        Self {
            now: AtomicI64::new(start.as_millis()),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, instant: EpochMillis) {
        self.now.store(instant.as_millis(), Ordering::SeqCst);
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let next = self.now().saturating_add(duration);
        self.set(next);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> EpochMillis {
        EpochMillis(self.now.load(Ordering::SeqCst))
    }
}
