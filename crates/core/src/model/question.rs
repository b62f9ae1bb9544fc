use thiserror::Error;

use crate::model::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question has no options")]
    NoOptions,

    #[error("question index {index} is out of range for {total} questions")]
    IndexOutOfRange { index: u32, total: u32 },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question as delivered by the session service.
///
/// Immutable once received; the controller replaces it wholesale on every
/// transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    question_id: QuestionId,
    text: String,
    options: Vec<String>,
    index: u32,
    total: u32,
}

impl Question {
    /// Build a question from service data.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoOptions` when `options` is empty and
    /// `QuestionError::IndexOutOfRange` when `index >= total`.
    pub fn new(
        question_id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        index: u32,
        total: u32,
    ) -> Result<Self, QuestionError> {
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if index >= total {
            return Err(QuestionError::IndexOutOfRange { index, total });
        }
        Ok(Self {
            question_id,
            text: text.into(),
            options,
            index,
            total,
        })
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    /// Zero-based position within the quiz.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// One-based position, as shown to players ("Q 2 / 5").
    #[must_use]
    pub fn position(&self) -> u32 {
        self.index + 1
    }
}

/// What the player is currently looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentQuestion {
    Active(Question),
    Finished,
}

impl CurrentQuestion {
    #[must_use]
    pub fn question(&self) -> Option<&Question> {
        match self {
            Self::Active(question) => Some(question),
            Self::Finished => None,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}
