use crate::model::Question;

/// Index sent when the player made no selection before the deadline.
pub const NO_SELECTION_INDEX: i64 = -1;

/// Payload for one answer submission.
///
/// A timeout is expressed as an empty answer together with
/// [`NO_SELECTION_INDEX`], so the service sees "no selection" whichever field
/// it inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSubmission {
    answer: String,
    answer_index: i64,
    client_ms: u64,
}

impl AnswerSubmission {
    /// Answer chosen by the player. The text is whitespace-normalized.
    #[must_use]
    pub fn selected(text: &str, index: usize, client_ms: u64) -> Self {
        Self {
            answer: normalize_answer(text),
            answer_index: i64::try_from(index).unwrap_or(i64::MAX),
            client_ms,
        }
    }

    /// Deadline expired without a selection.
    #[must_use]
    pub fn no_selection(client_ms: u64) -> Self {
        Self {
            answer: String::new(),
            answer_index: NO_SELECTION_INDEX,
            client_ms,
        }
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn answer_index(&self) -> i64 {
        self.answer_index
    }

    #[must_use]
    pub fn client_ms(&self) -> u64 {
        self.client_ms
    }

    #[must_use]
    pub fn is_no_selection(&self) -> bool {
        self.answer_index == NO_SELECTION_INDEX
    }
}

/// Collapse surrounding and repeated inner whitespace to single spaces.
#[must_use]
pub fn normalize_answer(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Service verdict for a submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Running score as reported by the service; `None` when the response
    /// omitted it, in which case the previous server value still stands.
    pub score: Option<i64>,
    pub finished: bool,
    /// Next question when the service includes it inline.
    pub next: Option<Question>,
}
