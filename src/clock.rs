//! Time helpers for the scheduler
//!
//! All scheduling decisions take "now" from a [`Clock`] so that session code
//! can be driven by a manual clock in tests. Elapsed-time helpers never
//! return negative values: a timestamp in the future counts as zero elapsed.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

const MILLIS_PER_MINUTE: f64 = 60_000.0;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Milliseconds elapsed from `since` to `now`, floored at zero
pub fn millis_since(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_milliseconds().max(0)
}

/// Whole days elapsed from `since` to `now` (24h periods, rounded down)
pub fn days_since(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    millis_since(since, now) / MILLIS_PER_DAY
}

/// Fractional minutes elapsed from `since` to `now`
pub fn minutes_since(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    millis_since(since, now) as f64 / MILLIS_PER_MINUTE
}
