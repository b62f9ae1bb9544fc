use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when an id string is not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// Integer ids issued by the quiz service. They travel as bare JSON numbers.
macro_rules! service_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                })
            }
        }
    };
}

service_id! {
    /// One play-through, as issued by `POST /library/session/create`.
    SessionId
}

service_id! {
    /// The quiz being played; also keys the leaderboard.
    QuizId
}

service_id! {
    QuestionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_display_and_debug() {
        assert_eq!(SessionId::new(42).to_string(), "42");
        assert_eq!(format!("{:?}", SessionId::new(42)), "SessionId(42)");
    }

    #[test]
    fn quiz_id_from_str_trims() {
        let id: QuizId = " 7 ".parse().unwrap();
        assert_eq!(id, QuizId::new(7));
    }

    #[test]
    fn question_id_from_str_invalid() {
        let err = "-3".parse::<QuestionId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse QuestionId from string");
    }

    #[test]
    fn ids_travel_as_bare_numbers() {
        let json = serde_json::to_string(&SessionId::new(9)).unwrap();
        assert_eq!(json, "9");
        let back: QuizId = serde_json::from_str("12").unwrap();
        assert_eq!(back, QuizId::new(12));
    }
}
