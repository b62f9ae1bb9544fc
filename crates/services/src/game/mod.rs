mod controller;
mod deadline;
mod guard;

// Public API of the gameplay subsystem.
pub use controller::{
    DEFAULT_TICK_PERIOD, DEFAULT_TIME_LIMIT_SECS, EventOutcome, GameController, GamePhase,
    GameSettings, GameSnapshot, PendingTimeout, TickerHandle,
};
pub use deadline::{Deadline, DeadlineManager, Expiry};
pub use guard::{SubmissionGuard, SubmissionPermit, Trigger};
