//! Shared error types for the services crate.

use thiserror::Error;

/// Code reported for transport failures where no response was obtained.
pub const NETWORK_ERROR_CODE: &str = "network_error";

/// Code reported when a response arrived but could not be understood.
pub const INVALID_RESPONSE_CODE: &str = "invalid_response";

/// Errors emitted by `SessionApi` implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    /// DNS failure, refused connection, reset, or similar.
    #[error("{message}")]
    Network { message: String },
    /// The service answered with `ok: false`.
    #[error("{message}")]
    Service { code: String, message: String },
}

impl ApiError {
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::service(INVALID_RESPONSE_CODE, message)
    }

    /// Machine-readable code (`network_error` or the service's own code).
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Network { .. } => NETWORK_ERROR_CODE,
            Self::Service { code, .. } => code,
        }
    }

    /// Text suitable for showing to the player.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Network { message } | Self::Service { message, .. } => message,
        }
    }

    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Category of a gameplay failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameErrorKind {
    NetworkError,
    ServiceError,
}

impl GameErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NetworkError => NETWORK_ERROR_CODE,
            Self::ServiceError => "service_error",
        }
    }
}

/// Errors emitted by `GameController` events.
///
/// Events that arrive in a state that cannot accept them are not errors; they
/// resolve to `EventOutcome::Ignored`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameError {
    #[error("failed to create session: {0}")]
    CreateSession(#[source] ApiError),
    #[error("failed to load question: {0}")]
    LoadQuestion(#[source] ApiError),
    #[error("failed to submit answer: {0}")]
    SubmitAnswer(#[source] ApiError),
    #[error("failed to load leaderboard: {0}")]
    Leaderboard(#[source] ApiError),
}

impl GameError {
    #[must_use]
    pub fn api_error(&self) -> &ApiError {
        match self {
            Self::CreateSession(err)
            | Self::LoadQuestion(err)
            | Self::SubmitAnswer(err)
            | Self::Leaderboard(err) => err,
        }
    }

    /// Code of the underlying failure, e.g. `network_error` or `not_found`.
    #[must_use]
    pub fn code(&self) -> &str {
        self.api_error().code()
    }

    #[must_use]
    pub fn kind(&self) -> GameErrorKind {
        if self.api_error().is_network() {
            GameErrorKind::NetworkError
        } else {
            GameErrorKind::ServiceError
        }
    }

    /// Message surfaced verbatim to the presentation layer.
    #[must_use]
    pub fn display_message(&self) -> String {
        self.api_error().message().to_owned()
    }
}
