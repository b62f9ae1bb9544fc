use std::env;

use async_trait::async_trait;
use quiz_core::model::{
    AnswerSubmission, CurrentQuestion, LeaderboardRow, PlayerName, Question, QuestionId, QuizId,
    SessionId, SubmitOutcome,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Base URL used when `QUIZ_API_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// Typed request layer over the remote session service.
///
/// Each method is exactly one network round trip. Implementations never retry
/// and never cache.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Create a play-through of `quiz_id` for `player_name`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` on transport failure and
    /// `ApiError::Service` when the service rejects the request.
    async fn create_session(
        &self,
        quiz_id: QuizId,
        player_name: &PlayerName,
    ) -> Result<SessionId, ApiError>;

    /// Fetch the question the session is currently on, or the finished marker.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport or service failures.
    async fn fetch_current(&self, session_id: SessionId) -> Result<CurrentQuestion, ApiError>;

    /// Submit an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport or service failures.
    async fn submit_answer(
        &self,
        session_id: SessionId,
        submission: &AnswerSubmission,
    ) -> Result<SubmitOutcome, ApiError>;

    /// Fetch the leaderboard for a quiz, best score first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport or service failures.
    async fn fetch_leaderboard(&self, quiz_id: QuizId) -> Result<Vec<LeaderboardRow>, ApiError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionClientConfig {
    pub base_url: String,
}

impl SessionClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("QUIZ_API_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        Self::new(base_url)
    }
}

impl Default for SessionClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// `SessionApi` over HTTP + JSON.
#[derive(Clone)]
pub struct HttpSessionClient {
    client: Client,
    config: SessionClientConfig,
}

impl HttpSessionClient {
    #[must_use]
    pub fn new(config: SessionClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(SessionClientConfig::from_env())
    }

    #[must_use]
    pub fn with_client(client: Client, config: SessionClientConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::network(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::network(err.to_string()))?;

        // The envelope is authoritative; HTTP status only matters when the
        // body is not an envelope at all.
        let envelope: Envelope = serde_json::from_slice(&body).map_err(|err| {
            tracing::warn!(%status, %err, "session service returned a non-envelope body");
            ApiError::invalid_response(format!("unexpected response from service (HTTP {status})"))
        })?;

        if !envelope.ok {
            let error = envelope.error.unwrap_or_default();
            return Err(ApiError::service(
                error.code.unwrap_or_else(|| "service_error".into()),
                error
                    .message
                    .unwrap_or_else(|| format!("request failed (HTTP {status})")),
            ));
        }

        let data = envelope.data.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(data)
            .map_err(|err| ApiError::invalid_response(format!("malformed response data: {err}")))
    }
}

#[async_trait]
impl SessionApi for HttpSessionClient {
    async fn create_session(
        &self,
        quiz_id: QuizId,
        player_name: &PlayerName,
    ) -> Result<SessionId, ApiError> {
        tracing::debug!(%quiz_id, player = %player_name, "creating session");
        let payload = CreateSessionRequest {
            quiz_id,
            player_name: player_name.as_str(),
        };
        let request = self
            .client
            .post(self.url("/library/session/create"))
            .json(&payload);
        let data: CreateSessionData = self.send(request).await?;
        Ok(data.session_id)
    }

    async fn fetch_current(&self, session_id: SessionId) -> Result<CurrentQuestion, ApiError> {
        tracing::debug!(%session_id, "fetching current question");
        let request = self
            .client
            .get(self.url(&format!("/library/session/{session_id}/current")));
        let data: CurrentData = self.send(request).await?;
        if data.finished {
            return Ok(CurrentQuestion::Finished);
        }
        let question = data.question.ok_or_else(|| {
            ApiError::invalid_response("current question is missing from the response")
        })?;
        Ok(CurrentQuestion::Active(question.into_question()?))
    }

    async fn submit_answer(
        &self,
        session_id: SessionId,
        submission: &AnswerSubmission,
    ) -> Result<SubmitOutcome, ApiError> {
        tracing::debug!(
            %session_id,
            answer_index = submission.answer_index(),
            client_ms = submission.client_ms(),
            "submitting answer"
        );
        let payload = AnswerRequest {
            answer: submission.answer(),
            answer_index: submission.answer_index(),
            answer_key: submission.answer_index(),
            client_ms: submission.client_ms(),
        };
        let request = self
            .client
            .post(self.url(&format!("/library/session/{session_id}/answer")))
            .json(&payload);
        let data: SubmitData = self.send(request).await?;
        let next = data.next.map(QuestionData::into_question).transpose()?;
        Ok(SubmitOutcome {
            score: data.score,
            finished: data.finished,
            next,
        })
    }

    async fn fetch_leaderboard(&self, quiz_id: QuizId) -> Result<Vec<LeaderboardRow>, ApiError> {
        tracing::debug!(%quiz_id, "fetching leaderboard");
        let request = self
            .client
            .get(self.url("/library/leaderboard"))
            .query(&[("quiz_id", quiz_id)]);
        let data: LeaderboardData = self.send(request).await?;
        Ok(data
            .top
            .into_iter()
            .map(|row| LeaderboardRow {
                player_name: row.player_name,
                score: row.score,
                duration_ms: row.duration_ms.unwrap_or(0),
                created_at: row.created_at,
            })
            .collect())
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    quiz_id: QuizId,
    player_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionData {
    session_id: SessionId,
}

#[derive(Debug, Serialize)]
struct AnswerRequest<'a> {
    answer: &'a str,
    answer_index: i64,
    answer_key: i64,
    client_ms: u64,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    #[serde(default)]
    finished: bool,
    #[serde(flatten)]
    question: Option<QuestionData>,
}

#[derive(Debug, Deserialize)]
struct QuestionData {
    question_id: QuestionId,
    question: String,
    options: Vec<String>,
    index: u32,
    total: u32,
}

impl QuestionData {
    fn into_question(self) -> Result<Question, ApiError> {
        Question::new(
            self.question_id,
            self.question,
            self.options,
            self.index,
            self.total,
        )
        .map_err(|err| ApiError::invalid_response(format!("invalid question: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    finished: bool,
    #[serde(default)]
    next: Option<QuestionData>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardData {
    #[serde(default)]
    top: Vec<LeaderboardRowData>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardRowData {
    player_name: String,
    score: i64,
    #[serde(default)]
    duration_ms: Option<i64>,
    #[serde(default)]
    created_at: Option<String>,
}
