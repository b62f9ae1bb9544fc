use chrono::{DateTime, Duration, Utc};

/// Absolute answer window for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub armed_at: DateTime<Utc>,
    pub limit: Duration,
    pub expires_at: DateTime<Utc>,
}

impl Deadline {
    #[must_use]
    pub fn new(armed_at: DateTime<Utc>, limit: Duration) -> Self {
        Self {
            armed_at,
            limit,
            expires_at: armed_at + limit,
        }
    }

    /// Time left at `now`, floored at zero.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Emitted once when an armed deadline runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub deadline: Deadline,
    pub fired_at: DateTime<Utc>,
}

/// Per-question countdown.
///
/// Time is passed in by the caller so the manager stays a plain state machine;
/// the controller owns the clock. An armed deadline yields at most one
/// [`Expiry`] and is disarmed in the same step, so later ticks cannot re-fire.
#[derive(Debug, Default)]
pub struct DeadlineManager {
    active: Option<Deadline>,
}

impl DeadlineManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a countdown of `limit` from `now`, replacing any previous one.
    pub fn arm(&mut self, now: DateTime<Utc>, limit: Duration) -> Deadline {
        let deadline = Deadline::new(now, limit);
        self.active = Some(deadline);
        deadline
    }

    pub fn disarm(&mut self) -> Option<Deadline> {
        self.active.take()
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Deadline> {
        self.active
    }

    /// Whole seconds left, rounded up; `None` while disarmed.
    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Option<u32> {
        let remaining_ms = self.active?.remaining(now).num_milliseconds();
        let seconds = (remaining_ms + 999) / 1000;
        Some(u32::try_from(seconds).unwrap_or(u32::MAX))
    }

    /// Periodic poll.
    ///
    /// Fires when the deadline has passed and no submission is in flight.
    /// While a submission is in flight the expiry is suppressed and the
    /// deadline left untouched; the submission disarms it.
    pub fn tick(&mut self, now: DateTime<Utc>, submission_in_flight: bool) -> Option<Expiry> {
        let deadline = self.active?;
        if submission_in_flight || deadline.remaining(now) > Duration::zero() {
            return None;
        }
        self.active = None;
        Some(Expiry {
            deadline,
            fired_at: now,
        })
    }
}
