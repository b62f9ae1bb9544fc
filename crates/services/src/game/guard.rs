use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What started a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    User,
    Timeout,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Timeout => f.write_str("timeout"),
        }
    }
}

/// Single-flight lock for answer submissions.
///
/// Whoever acquires first owns the submission; everyone else is dropped, not
/// queued.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGuard {
    in_flight: Arc<AtomicBool>,
}

impl SubmissionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or `None` if a submission is already running.
    #[must_use]
    pub fn try_acquire(&self, trigger: Trigger) -> Option<SubmissionPermit> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmissionPermit {
                in_flight: Arc::clone(&self.in_flight),
                trigger,
            })
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Proof of holding the submission lock. Released on drop, on every path.
#[derive(Debug)]
pub struct SubmissionPermit {
    in_flight: Arc<AtomicBool>,
    trigger: Trigger,
}

impl SubmissionPermit {
    #[must_use]
    pub fn trigger(&self) -> Trigger {
        self.trigger
    }
}

impl Drop for SubmissionPermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
