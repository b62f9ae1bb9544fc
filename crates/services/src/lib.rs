#![forbid(unsafe_code)]

pub mod error;
pub mod game;
pub mod session_client;

pub use quiz_core::Clock;

pub use error::{ApiError, GameError, GameErrorKind};
pub use game::{
    EventOutcome, GameController, GamePhase, GameSettings, GameSnapshot, PendingTimeout,
    TickerHandle,
};
pub use session_client::{HttpSessionClient, SessionApi, SessionClientConfig};
