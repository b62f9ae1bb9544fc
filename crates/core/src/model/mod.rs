mod answer;
mod ids;
mod leaderboard;
mod question;
mod session;

pub use answer::{AnswerSubmission, NO_SELECTION_INDEX, SubmitOutcome, normalize_answer};
pub use ids::{ParseIdError, QuestionId, QuizId, SessionId};
pub use leaderboard::LeaderboardRow;
pub use question::{CurrentQuestion, Question, QuestionError};
pub use session::{GUEST_PLAYER, PlayerName, Session};
