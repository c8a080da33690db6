//! Clocks and timestamp conventions.
//!
//! Stored timestamps are seconds since the Unix epoch as `f64`, matching the
//! documents the store has always written. Recommendation ids are the local
//! wall-clock time at second granularity, formatted `YYYYMMDD-HHMMSS`.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Local, Utc};

/// Smallest step used to keep `updated_at` strictly increasing.
const MIN_STAMP_STEP: f64 = 1e-6;

/// Source of the current time for a store.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock.
///
/// Time only moves when [`advance`](Self::advance) or [`set`](Self::set) is
/// called, which makes id collisions and ordering reproducible.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use profilestore::time::{Clock, ManualClock};
///
/// let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
/// clock.advance(Duration::seconds(5));
/// assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 5).unwrap());
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Jumps the clock to `to`.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Converts an instant into fractional seconds since the Unix epoch.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_micros()) / 1_000_000.0
}

/// Returns the `updated_at` to store when a record changes at `now`.
///
/// The result is strictly greater than `previous`, even if the clock has not
/// advanced since the last write.
#[must_use]
pub fn next_update_stamp(now: f64, previous: Option<f64>) -> f64 {
    match previous {
        Some(prev) if now <= prev => prev + MIN_STAMP_STEP,
        _ => now,
    }
}

/// Formats `at` as a recommendation id in local time (`YYYYMMDD-HHMMSS`).
#[must_use]
pub fn recommendation_stamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y%m%d-%H%M%S").to_string()
}
