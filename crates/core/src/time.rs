use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::time::{Interval, MissedTickBehavior};

/// A clock abstraction for deterministic time in services and tests.
///
/// `Manual` clocks share their instant between clones, so a test can hand one
/// copy to a controller and advance another.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    #[default]
    Default,
    Manual(Arc<Mutex<DateTime<Utc>>>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a manually driven clock starting at the given timestamp.
    #[must_use]
    pub fn manual(at: DateTime<Utc>) -> Self {
        Self::Manual(Arc::new(Mutex::new(at)))
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Manual(t) => *t.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// If this is a manual clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`. Every clone of a manual clock
    /// observes the change.
    pub fn advance(&self, delta: Duration) {
        if let Clock::Manual(t) = self {
            let mut guard = t.lock().unwrap_or_else(PoisonError::into_inner);
            *guard += delta;
        }
    }

    /// Returns true if this clock represents real time.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Clock::Default)
    }

    /// Returns true if this clock is manually driven.
    #[must_use]
    pub fn is_manual(&self) -> bool {
        matches!(self, Clock::Manual(_))
    }

    /// Repeating tick used to poll deadlines.
    ///
    /// Missed ticks are skipped rather than bursted, so a stalled runtime
    /// produces one catch-up tick instead of a backlog. Must be called from
    /// within a tokio runtime.
    #[must_use]
    pub fn ticker(&self, period: StdDuration) -> Interval {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a manual `Clock` starting at the deterministic test timestamp.
#[must_use]
pub fn manual_clock() -> Clock {
    Clock::manual(fixed_now())
}

/// Renders a millisecond count as seconds with 0.1 s precision, never negative.
#[must_use]
pub fn format_elapsed_seconds(ms: i64) -> f64 {
    let tenths = (ms as f64 / 100.0).round() / 10.0;
    tenths.max(0.0)
}
