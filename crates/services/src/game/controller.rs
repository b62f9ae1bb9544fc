use std::env;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use quiz_core::Clock;
use quiz_core::model::{
    AnswerSubmission, CurrentQuestion, LeaderboardRow, PlayerName, Question, QuizId, Session,
    SessionId, normalize_answer,
};
use tokio::task::JoinHandle;

use super::deadline::{DeadlineManager, Expiry};
use super::guard::{SubmissionGuard, Trigger};
use crate::error::GameError;
use crate::session_client::SessionApi;

/// Seconds a player gets per question unless configured otherwise.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 20;

/// How often the ticker polls the deadline.
pub const DEFAULT_TICK_PERIOD: StdDuration = StdDuration::from_millis(100);

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    pub time_limit: Duration,
    pub tick_period: StdDuration,
}

impl GameSettings {
    #[must_use]
    pub fn with_time_limit_secs(mut self, secs: u32) -> Self {
        self.time_limit = Duration::seconds(i64::from(secs.max(1)));
        self
    }

    /// Defaults, with `QUIZ_TIME_LIMIT_SECS` applied when it parses.
    #[must_use]
    pub fn from_env() -> Self {
        let settings = Self::default();
        match env::var("QUIZ_TIME_LIMIT_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
        {
            Some(secs) => settings.with_time_limit_secs(secs),
            None => settings,
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            time_limit: Duration::seconds(i64::from(DEFAULT_TIME_LIMIT_SECS)),
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }
}

//
// ─── PUBLIC STATE ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    Starting,
    Playing,
    Submitting,
    Finished,
}

/// Result of feeding an event to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// The event could not be accepted in the current state and was dropped.
    Ignored,
}

/// Everything a presentation layer needs to render the game screen.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub session: Option<Session>,
    pub current: Option<CurrentQuestion>,
    pub score: i64,
    pub remaining_seconds: Option<u32>,
    pub last_error: Option<String>,
    pub leaderboard: Vec<LeaderboardRow>,
    /// Set once the leaderboard request has completed, successfully or not.
    /// `phase` turns `Finished` before this does.
    pub leaderboard_loaded: bool,
    pub total_elapsed_ms: u64,
    pub closed: bool,
}

/// An expired deadline waiting to be turned into a timeout submission.
///
/// Bound to the question it was armed for; it is dropped if the game has
/// moved on by the time it is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimeout {
    pub expiry: Expiry,
    round: u64,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

struct GameState {
    phase: GamePhase,
    session: Option<Session>,
    current: Option<CurrentQuestion>,
    /// Bumped each time a question is shown.
    round: u64,
    question_started_at: Option<DateTime<Utc>>,
    deadline: DeadlineManager,
    score: i64,
    total_elapsed_ms: u64,
    last_error: Option<String>,
    leaderboard: Vec<LeaderboardRow>,
    leaderboard_requested: bool,
    leaderboard_loaded: bool,
    closed: bool,
}

impl GameState {
    fn new() -> Self {
        Self {
            phase: GamePhase::Idle,
            session: None,
            current: None,
            round: 0,
            question_started_at: None,
            deadline: DeadlineManager::new(),
            score: 0,
            total_elapsed_ms: 0,
            last_error: None,
            leaderboard: Vec::new(),
            leaderboard_requested: false,
            leaderboard_loaded: false,
            closed: false,
        }
    }
}

struct Shared {
    api: Arc<dyn SessionApi>,
    quiz_id: QuizId,
    player_name: PlayerName,
    settings: GameSettings,
    clock: Clock,
    guard: SubmissionGuard,
    state: Mutex<GameState>,
}

enum Choice<'a> {
    Selected { text: &'a str, index: usize },
    NoSelection { round: u64 },
}

enum AfterSubmit {
    Continue,
    Finished,
    Refetch,
}

/// Drives one play-through: session creation, per-question countdown,
/// answer submission and the final leaderboard.
///
/// Cloning yields another handle to the same game. Each play-through gets its
/// own controller; nothing is shared between sessions.
#[derive(Clone)]
pub struct GameController {
    shared: Arc<Shared>,
}

impl GameController {
    #[must_use]
    pub fn new(
        api: Arc<dyn SessionApi>,
        quiz_id: QuizId,
        player_name: PlayerName,
        settings: GameSettings,
        clock: Clock,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                quiz_id,
                player_name,
                settings,
                clock,
                guard: SubmissionGuard::new(),
                state: Mutex::new(GameState::new()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, GameState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.shared.quiz_id
    }

    #[must_use]
    pub fn player_name(&self) -> &PlayerName {
        &self.shared.player_name
    }

    #[must_use]
    pub fn settings(&self) -> GameSettings {
        self.shared.settings
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.state().phase
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.shared.guard.is_held()
    }

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let now = self.shared.clock.now();
        let state = self.state();
        GameSnapshot {
            phase: state.phase,
            session: state.session.clone(),
            current: state.current.clone(),
            score: state.score,
            remaining_seconds: state.deadline.remaining_seconds(now),
            last_error: state.last_error.clone(),
            leaderboard: state.leaderboard.clone(),
            leaderboard_loaded: state.leaderboard_loaded,
            total_elapsed_ms: state.total_elapsed_ms,
            closed: state.closed,
        }
    }

    /// Create a session and load its first question.
    ///
    /// Ignored unless the controller is idle. On failure the controller
    /// returns to idle with the error recorded, so `start` can be retried.
    pub async fn start(&self) -> Result<EventOutcome, GameError> {
        {
            let mut state = self.state();
            if state.closed || state.phase != GamePhase::Idle {
                tracing::debug!(phase = ?state.phase, "start ignored");
                return Ok(EventOutcome::Ignored);
            }
            state.phase = GamePhase::Starting;
            state.last_error = None;
        }

        let quiz_id = self.shared.quiz_id;
        let player_name = &self.shared.player_name;
        let session_id = match self.shared.api.create_session(quiz_id, player_name).await {
            Ok(session_id) => session_id,
            Err(err) => return self.fail_start(GameError::CreateSession(err)),
        };
        tracing::info!(%session_id, %quiz_id, player = %player_name, "session created");

        {
            let mut state = self.state();
            if state.closed {
                return Ok(EventOutcome::Ignored);
            }
            state.session = Some(Session::new(session_id, quiz_id, player_name.clone()));
        }

        let current = match self.shared.api.fetch_current(session_id).await {
            Ok(current) => current,
            Err(err) => return self.fail_start(GameError::LoadQuestion(err)),
        };

        let finished = {
            let mut state = self.state();
            if state.closed {
                return Ok(EventOutcome::Ignored);
            }
            state.score = 0;
            state.total_elapsed_ms = 0;
            self.adopt_current(&mut state, current)
        };
        if finished {
            self.load_leaderboard().await;
        }
        Ok(EventOutcome::Applied)
    }

    fn fail_start(&self, err: GameError) -> Result<EventOutcome, GameError> {
        tracing::warn!(error = %err, "could not start game");
        let mut state = self.state();
        if !state.closed {
            state.phase = GamePhase::Idle;
            state.session = None;
            state.last_error = Some(err.display_message());
        }
        Err(err)
    }

    /// Player picked `text` at position `index` of the current question.
    ///
    /// Ignored when no question is on screen, a submission is already in
    /// flight, or the option does not belong to the current question.
    pub async fn select_answer(&self, text: &str, index: usize) -> Result<EventOutcome, GameError> {
        self.submit(Trigger::User, Choice::Selected { text, index })
            .await
    }

    /// Check the countdown; returns the expiry if it fired on this poll.
    ///
    /// Fires at most once per question and never while a submission holds
    /// the guard.
    pub fn poll_deadline(&self) -> Option<PendingTimeout> {
        let now = self.shared.clock.now();
        let mut state = self.state();
        if state.closed || state.phase != GamePhase::Playing {
            return None;
        }
        let expiry = state.deadline.tick(now, self.shared.guard.is_held())?;
        tracing::info!(round = state.round, expired_at = %expiry.deadline.expires_at, "answer window closed");
        Some(PendingTimeout {
            expiry,
            round: state.round,
        })
    }

    /// Submit "no selection" for the question the timeout was raised on.
    pub async fn submit_timeout(&self, pending: PendingTimeout) -> Result<EventOutcome, GameError> {
        self.submit(Trigger::Timeout, Choice::NoSelection {
            round: pending.round,
        })
        .await
    }

    /// One clock tick: poll the deadline and, on expiry, run the timeout
    /// submission to completion.
    pub async fn tick(&self) -> Result<EventOutcome, GameError> {
        match self.poll_deadline() {
            Some(pending) => self.submit_timeout(pending).await,
            None => Ok(EventOutcome::Ignored),
        }
    }

    async fn submit(&self, trigger: Trigger, choice: Choice<'_>) -> Result<EventOutcome, GameError> {
        let Some(permit) = self.shared.guard.try_acquire(trigger) else {
            tracing::debug!(%trigger, "submission already in flight, dropping");
            return Ok(EventOutcome::Ignored);
        };

        let (session_id, submission) = {
            let mut state = self.state();
            let Some(session_id) = self.accepting_session(&state, &choice) else {
                tracing::debug!(%trigger, phase = ?state.phase, "answer ignored");
                return Ok(EventOutcome::Ignored);
            };

            let now = self.shared.clock.now();
            state.deadline.disarm();
            let elapsed_ms = state
                .question_started_at
                .map_or(0, |started| elapsed_millis(started, now));
            state.total_elapsed_ms = state.total_elapsed_ms.saturating_add(elapsed_ms);
            state.phase = GamePhase::Submitting;
            state.last_error = None;

            let submission = match choice {
                Choice::Selected { text, index } => {
                    AnswerSubmission::selected(text, index, elapsed_ms)
                }
                Choice::NoSelection { .. } => AnswerSubmission::no_selection(elapsed_ms),
            };
            (session_id, submission)
        };

        tracing::info!(
            %session_id,
            trigger = %permit.trigger(),
            client_ms = submission.client_ms(),
            "submitting answer"
        );
        let outcome = match self.shared.api.submit_answer(session_id, &submission).await {
            Ok(outcome) => outcome,
            Err(err) => return self.fail_submit(GameError::SubmitAnswer(err)),
        };

        let after = {
            let mut state = self.state();
            if state.closed {
                tracing::debug!(%session_id, "controller closed, discarding submit result");
                return Ok(EventOutcome::Ignored);
            }
            if let Some(score) = outcome.score {
                state.score = score;
            }
            if outcome.finished {
                self.finish(&mut state);
                AfterSubmit::Finished
            } else if let Some(next) = outcome.next {
                self.begin_question(&mut state, next);
                AfterSubmit::Continue
            } else {
                AfterSubmit::Refetch
            }
        };

        match after {
            AfterSubmit::Continue => {}
            AfterSubmit::Finished => self.load_leaderboard().await,
            AfterSubmit::Refetch => {
                let current = match self.shared.api.fetch_current(session_id).await {
                    Ok(current) => current,
                    Err(err) => return self.fail_submit(GameError::LoadQuestion(err)),
                };
                let finished = {
                    let mut state = self.state();
                    if state.closed {
                        return Ok(EventOutcome::Ignored);
                    }
                    self.adopt_current(&mut state, current)
                };
                if finished {
                    self.load_leaderboard().await;
                }
            }
        }

        drop(permit);
        Ok(EventOutcome::Applied)
    }

    /// Session id if `choice` may be submitted right now.
    fn accepting_session(&self, state: &GameState, choice: &Choice<'_>) -> Option<SessionId> {
        if state.closed || state.phase != GamePhase::Playing {
            return None;
        }
        let question = state.current.as_ref()?.question()?;
        match choice {
            Choice::Selected { text, index } => {
                let option = question.option(*index)?;
                if normalize_answer(option) != normalize_answer(text) {
                    return None;
                }
            }
            Choice::NoSelection { round } => {
                if *round != state.round {
                    return None;
                }
            }
        }
        state.session.as_ref().map(Session::session_id)
    }

    fn fail_submit(&self, err: GameError) -> Result<EventOutcome, GameError> {
        tracing::warn!(error = %err, "answer submission failed");
        let mut state = self.state();
        if !state.closed {
            // The question on screen stays; the player may retry by clicking.
            state.phase = GamePhase::Playing;
            state.last_error = Some(err.display_message());
        }
        Err(err)
    }

    /// Returns true when the service reported the quiz finished.
    fn adopt_current(&self, state: &mut GameState, current: CurrentQuestion) -> bool {
        match current {
            CurrentQuestion::Active(question) => {
                self.begin_question(state, question);
                false
            }
            CurrentQuestion::Finished => {
                self.finish(state);
                true
            }
        }
    }

    fn begin_question(&self, state: &mut GameState, question: Question) {
        let now = self.shared.clock.now();
        state.deadline.arm(now, self.shared.settings.time_limit);
        state.question_started_at = Some(now);
        state.round += 1;
        tracing::info!(
            question = question.position(),
            total = question.total(),
            "question shown"
        );
        state.current = Some(CurrentQuestion::Active(question));
        state.phase = GamePhase::Playing;
    }

    fn finish(&self, state: &mut GameState) {
        state.deadline.disarm();
        state.question_started_at = None;
        state.current = Some(CurrentQuestion::Finished);
        state.phase = GamePhase::Finished;
        tracing::info!(quiz_id = %self.shared.quiz_id, score = state.score, "game finished");
    }

    /// Fetch the leaderboard once per game. Failures leave the board empty.
    async fn load_leaderboard(&self) {
        {
            let mut state = self.state();
            if state.closed || state.leaderboard_requested {
                return;
            }
            state.leaderboard_requested = true;
        }

        let result = self.shared.api.fetch_leaderboard(self.shared.quiz_id).await;
        let mut state = self.state();
        if state.closed {
            return;
        }
        state.leaderboard_loaded = true;
        match result {
            Ok(rows) => state.leaderboard = rows,
            Err(err) => {
                let err = GameError::Leaderboard(err);
                tracing::warn!(error = %err, "leaderboard unavailable");
                state.leaderboard.clear();
                state.last_error = Some(err.display_message());
            }
        }
    }

    /// Tear down: stop the countdown and discard any result still in flight.
    pub fn close(&self) {
        let mut state = self.state();
        if state.closed {
            return;
        }
        state.closed = true;
        state.deadline.disarm();
        tracing::debug!(quiz_id = %self.shared.quiz_id, "controller closed");
    }

    /// Run the deadline poll on the clock's ticker in a background task.
    ///
    /// Expiries spawn their own submission task so the tick never waits on
    /// the network. The task ends when the controller is closed or the
    /// returned handle is stopped or dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn spawn_ticker(&self) -> TickerHandle {
        let controller = self.clone();
        let period = self.shared.settings.tick_period;
        let handle = tokio::spawn(async move {
            let mut ticker = controller.shared.clock.ticker(period);
            loop {
                ticker.tick().await;
                if controller.is_closed() {
                    break;
                }
                if let Some(pending) = controller.poll_deadline() {
                    let expired = controller.clone();
                    tokio::spawn(async move {
                        if let Err(err) = expired.submit_timeout(pending).await {
                            tracing::warn!(error = %err, "timeout submission failed");
                        }
                    });
                }
            }
        });
        TickerHandle {
            handle: Some(handle),
        }
    }
}

fn elapsed_millis(started: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - started).num_milliseconds()).unwrap_or(0)
}

/// Owns the background ticker task; aborts it on drop.
#[derive(Debug)]
pub struct TickerHandle {
    handle: Option<JoinHandle<()>>,
}

impl TickerHandle {
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_use_twenty_second_limit() {
        let settings = GameSettings::default();
        assert_eq!(settings.time_limit, Duration::seconds(20));
        assert_eq!(settings.tick_period, StdDuration::from_millis(100));
    }

    #[test]
    fn time_limit_is_at_least_one_second() {
        let settings = GameSettings::default().with_time_limit_secs(0);
        assert_eq!(settings.time_limit, Duration::seconds(1));
    }

    #[test]
    fn elapsed_never_negative() {
        let now = quiz_core::time::fixed_now();
        assert_eq!(elapsed_millis(now, now - Duration::seconds(1)), 0);
        assert_eq!(elapsed_millis(now, now + Duration::milliseconds(3_250)), 3_250);
    }
}
