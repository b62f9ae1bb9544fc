use std::fmt;

use crate::model::{QuizId, SessionId};

/// Name used when no player identity is provided.
pub const GUEST_PLAYER: &str = "guest";

/// Display name a session is played under.
///
/// Always trimmed and non-empty; blank input falls back to [`GUEST_PLAYER`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerName(String);

impl PlayerName {
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            Self::guest()
        } else {
            Self(trimmed.to_owned())
        }
    }

    #[must_use]
    pub fn guest() -> Self {
        Self(GUEST_PLAYER.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0 == GUEST_PLAYER
    }
}

impl Default for PlayerName {
    fn default() -> Self {
        Self::guest()
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One play-through of a quiz, created by the session service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    session_id: SessionId,
    quiz_id: QuizId,
    player_name: PlayerName,
}

impl Session {
    #[must_use]
    pub fn new(session_id: SessionId, quiz_id: QuizId, player_name: PlayerName) -> Self {
        Self {
            session_id,
            quiz_id,
            player_name,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn player_name(&self) -> &PlayerName {
        &self.player_name
    }
}
