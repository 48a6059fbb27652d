//! Time source used by rate limiting and audit timestamps.
//!
//! Components take an `Arc<dyn Clock>` so windowing can be exercised with a
//! [`ManualClock`] instead of real sleeps.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Longest configurable window or lifetime. Larger settings are clamped so
/// `now - span` and `now + span` stay representable.
pub const MAX_SPAN_DAYS: i64 = 36_500;

fn clamp_span(span: Option<Duration>) -> Duration {
    let max = Duration::days(MAX_SPAN_DAYS);
    span.map_or(max, |span| span.min(max))
}

/// Converts configured seconds into a [`Duration`], clamped to [`MAX_SPAN_DAYS`].
#[must_use]
pub fn span_seconds(seconds: u64) -> Duration {
    clamp_span(i64::try_from(seconds).ok().and_then(Duration::try_seconds))
}

/// Converts configured minutes into a [`Duration`], clamped to
/// [`MAX_SPAN_DAYS`]. Negative values become zero.
#[must_use]
pub fn span_minutes(minutes: i64) -> Duration {
    clamp_span(Duration::try_minutes(minutes.max(0)))
}

pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
