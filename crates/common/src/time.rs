//! Time abstraction for testability
//!
//! Provides a trait-based approach to time operations so gating, log
//! windowing, and TTL checks can run against deterministic time in tests.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use stopllms_common::time::{Clock, MockClock, SystemClock};
//!
//! // Use the system clock in production
//! let clock = SystemClock;
//! let _now = clock.now_ms();
//!
//! // Use the mock clock in tests
//! let mock = MockClock::new(1_000);
//! mock.advance(Duration::from_secs(5));
//! assert_eq!(mock.now_ms(), 6_000);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Trait for time operations to enable testing
pub trait Clock: Send + Sync {
    /// Milliseconds since the UNIX epoch.
    fn now_ms(&self) -> u64;

    /// Current wall-clock time as UTC.
    fn now_utc(&self) -> DateTime<Utc> {
        ms_to_utc(self.now_ms())
    }
}

/// Convert epoch milliseconds to a UTC timestamp.
///
/// Out-of-range values clamp to the epoch rather than failing; the inputs
/// here are always clock readings, not untrusted data.
pub fn ms_to_utc(ms: u64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms as i64).single().unwrap_or_default()
}

/// Format epoch milliseconds as an ISO-8601 string with millisecond
/// precision (`2026-01-02T03:04:05.678Z`).
pub fn ms_to_iso(ms: u64) -> String {
    ms_to_utc(ms).to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Real system clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Mock clock for deterministic testing
///
/// Time only moves when the test advances it.
#[derive(Debug, Clone)]
pub struct MockClock {
    now_ms: Arc<Mutex<u64>>,
}

impl MockClock {
    /// Create a mock clock starting at the given epoch-milliseconds value.
    pub fn new(start_ms: u64) -> Self {
        Self { now_ms: Arc::new(Mutex::new(start_ms)) }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, by: Duration) {
        *self.now_ms.lock() += by.as_millis() as u64;
    }

    /// Jump the clock to an absolute epoch-milliseconds value.
    pub fn set(&self, ms: u64) {
        *self.now_ms.lock() = ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        *self.now_ms.lock()
    }
}
