#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiz_core::model::{
    AnswerSubmission, CurrentQuestion, LeaderboardRow, PlayerName, Question, QuestionId, QuizId,
    SessionId, SubmitOutcome,
};
use services::{ApiError, SessionApi};
use tokio::sync::Semaphore;

pub const SESSION_ID: u64 = 77;

/// Everything the fake observed, in call order.
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub creates: Vec<(QuizId, PlayerName)>,
    pub currents: Vec<SessionId>,
    pub submissions: Vec<(SessionId, AnswerSubmission)>,
    pub leaderboards: Vec<QuizId>,
}

/// Scripted `SessionApi`: responses are popped in order, calls are recorded.
#[derive(Default)]
pub struct FakeSessionApi {
    creates: Mutex<VecDeque<Result<SessionId, ApiError>>>,
    currents: Mutex<VecDeque<Result<CurrentQuestion, ApiError>>>,
    submits: Mutex<VecDeque<Result<SubmitOutcome, ApiError>>>,
    leaderboard: Mutex<Option<Result<Vec<LeaderboardRow>, ApiError>>>,
    calls: Mutex<Calls>,
    create_gate: Option<Arc<Semaphore>>,
    submit_gate: Option<Arc<Semaphore>>,
    leaderboard_gate: Option<Arc<Semaphore>>,
}

impl FakeSessionApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every `submit_answer` until the returned semaphore gets a permit.
    pub fn gate_submits(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.submit_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Hold every `create_session` until the returned semaphore gets a permit.
    pub fn gate_creates(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.create_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Hold every `fetch_leaderboard` until the returned semaphore gets a permit.
    pub fn gate_leaderboard(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.leaderboard_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn push_create(&self, result: Result<SessionId, ApiError>) -> &Self {
        self.creates.lock().unwrap().push_back(result);
        self
    }

    pub fn push_current(&self, result: Result<CurrentQuestion, ApiError>) -> &Self {
        self.currents.lock().unwrap().push_back(result);
        self
    }

    pub fn push_submit(&self, result: Result<SubmitOutcome, ApiError>) -> &Self {
        self.submits.lock().unwrap().push_back(result);
        self
    }

    pub fn set_leaderboard(&self, result: Result<Vec<LeaderboardRow>, ApiError>) -> &Self {
        *self.leaderboard.lock().unwrap() = Some(result);
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.calls.lock().unwrap().submissions.len()
    }
}

async fn pass_gate(gate: Option<&Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.unwrap().forget();
    }
}

#[async_trait]
impl SessionApi for FakeSessionApi {
    async fn create_session(
        &self,
        quiz_id: QuizId,
        player_name: &PlayerName,
    ) -> Result<SessionId, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .creates
            .push((quiz_id, player_name.clone()));
        pass_gate(self.create_gate.as_ref()).await;
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(SessionId::new(SESSION_ID)))
    }

    async fn fetch_current(&self, session_id: SessionId) -> Result<CurrentQuestion, ApiError> {
        self.calls.lock().unwrap().currents.push(session_id);
        self.currents
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(CurrentQuestion::Finished))
    }

    async fn submit_answer(
        &self,
        session_id: SessionId,
        submission: &AnswerSubmission,
    ) -> Result<SubmitOutcome, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .submissions
            .push((session_id, submission.clone()));
        pass_gate(self.submit_gate.as_ref()).await;
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::service("unscripted", "no submit scripted")))
    }

    async fn fetch_leaderboard(&self, quiz_id: QuizId) -> Result<Vec<LeaderboardRow>, ApiError> {
        self.calls.lock().unwrap().leaderboards.push(quiz_id);
        pass_gate(self.leaderboard_gate.as_ref()).await;
        self.leaderboard
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn question(id: u64, index: u32, total: u32) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Question {id}?"),
        vec!["red".into(), "green".into(), "blue".into()],
        index,
        total,
    )
    .unwrap()
}

pub fn active(id: u64, index: u32, total: u32) -> CurrentQuestion {
    CurrentQuestion::Active(question(id, index, total))
}

pub fn row(player: &str, score: i64, duration_ms: i64) -> LeaderboardRow {
    LeaderboardRow {
        player_name: player.into(),
        score,
        duration_ms,
        created_at: None,
    }
}
