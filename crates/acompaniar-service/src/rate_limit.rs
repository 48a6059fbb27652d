//! In-memory sliding-window rate limiting.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};

use acompaniar_core::clock::{Clock, span_seconds};
use acompaniar_core::config::WindowConfig;

/// Allows at most `max_requests` calls per key within any `window`.
///
/// The whole table sits behind one mutex, so checking the window and
/// recording the call happen atomically for concurrent callers.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    table: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window,
            clock,
            table: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn from_config(config: &WindowConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.max_requests, span_seconds(config.window_seconds), clock)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<DateTime<Utc>>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// ## Summary
    /// Records a call for `key` and returns true, or returns false without
    /// recording if the key has used its budget for the current window.
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.now();
        let window_start = now - self.window;
        let mut table = self.lock();

        let history = table.entry(key.to_string()).or_default();
        while history.front().is_some_and(|at| *at <= window_start) {
            history.pop_front();
        }

        if history.len() >= self.max_requests {
            tracing::debug!(key, used = history.len(), "Rate limit reached");
            return false;
        }

        history.push_back(now);
        true
    }

    /// ## Summary
    /// Seconds until the oldest recorded call leaves the window, or 0 if the
    /// key has no history.
    #[must_use]
    pub fn wait_time(&self, key: &str) -> u64 {
        let now = self.clock.now();
        let table = self.lock();

        table
            .get(key)
            .and_then(|history| history.front())
            .map_or(0, |oldest| {
                let remaining = (*oldest + self.window - now).num_seconds();
                u64::try_from(remaining).unwrap_or(0)
            })
    }

    /// Forgets every recorded call for `key`.
    pub fn reset(&self, key: &str) {
        self.lock().remove(key);
    }
}
