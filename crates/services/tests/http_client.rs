use quiz_core::model::{AnswerSubmission, CurrentQuestion, PlayerName, QuestionId, QuizId, SessionId};
use serde_json::json;
use services::{ApiError, HttpSessionClient, SessionApi, SessionClientConfig};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpSessionClient {
    HttpSessionClient::new(SessionClientConfig::new(format!("{}/api/", server.uri())))
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "data": data }))
}

#[tokio::test]
async fn create_session_posts_quiz_and_player() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/library/session/create"))
        .and(body_json(json!({ "quiz_id": 3, "player_name": "ada" })))
        .respond_with(ok(json!({ "session_id": 41 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sid = client
        .create_session(QuizId::new(3), &PlayerName::new("ada"))
        .await
        .unwrap();
    assert_eq!(sid, SessionId::new(41));
}

#[tokio::test]
async fn fetch_current_decodes_question_and_finished() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/library/session/41/current"))
        .respond_with(ok(json!({
            "finished": false,
            "question_id": 9,
            "question": "Largest ocean?",
            "options": ["Pacific", "Atlantic", "Indian", "Arctic"],
            "index": 0,
            "total": 4
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/library/session/42/current"))
        .respond_with(ok(json!({ "finished": true, "score": 1200 })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let current = client.fetch_current(SessionId::new(41)).await.unwrap();
    let question = current.question().unwrap();
    assert_eq!(question.question_id(), QuestionId::new(9));
    assert_eq!(question.text(), "Largest ocean?");
    assert_eq!(question.options().len(), 4);
    assert_eq!(question.position(), 1);
    assert_eq!(question.total(), 4);

    let done = client.fetch_current(SessionId::new(42)).await.unwrap();
    assert_eq!(done, CurrentQuestion::Finished);
}

#[tokio::test]
async fn submit_answer_sends_normalized_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/library/session/41/answer"))
        .and(body_json(json!({
            "answer": "Pacific Ocean",
            "answer_index": 0,
            "answer_key": 0,
            "client_ms": 2500
        })))
        .respond_with(ok(json!({
            "finished": false,
            "score": 750,
            "next": {
                "question_id": 10,
                "question": "Smallest ocean?",
                "options": ["Arctic", "Indian"],
                "index": 1,
                "total": 4
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let submission = AnswerSubmission::selected("  Pacific   Ocean ", 0, 2_500);
    let outcome = client
        .submit_answer(SessionId::new(41), &submission)
        .await
        .unwrap();
    assert_eq!(outcome.score, Some(750));
    assert!(!outcome.finished);
    assert_eq!(outcome.next.unwrap().question_id(), QuestionId::new(10));
}

#[tokio::test]
async fn submit_timeout_sends_no_selection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/library/session/41/answer"))
        .and(body_json(json!({
            "answer": "",
            "answer_index": -1,
            "answer_key": -1,
            "client_ms": 20000
        })))
        .respond_with(ok(json!({ "finished": true, "score": 750 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let outcome = client
        .submit_answer(SessionId::new(41), &AnswerSubmission::no_selection(20_000))
        .await
        .unwrap();
    assert!(outcome.finished);
    assert_eq!(outcome.score, Some(750));
    assert!(outcome.next.is_none());
}

#[tokio::test]
async fn leaderboard_keeps_service_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/library/leaderboard"))
        .and(query_param("quiz_id", "3"))
        .respond_with(ok(json!({ "top": [
            { "player_name": "ada", "score": 1900, "duration_ms": 8100,
              "created_at": "2024-05-01T10:00:00" },
            { "player_name": "bob", "score": 900, "duration_ms": null }
        ]})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rows = client.fetch_leaderboard(QuizId::new(3)).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].player_name, "ada");
    assert_eq!(rows[0].created_at.as_deref(), Some("2024-05-01T10:00:00"));
    assert!((rows[0].duration_seconds() - 8.1).abs() < f64::EPSILON);
    assert_eq!(rows[1].score, 900);
    assert_eq!(rows[1].duration_ms, 0);
}

#[tokio::test]
async fn service_error_envelope_is_reported_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/library/session/99/current"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "ok": false,
            "error": { "code": "not_found", "message": "session not found" }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_current(SessionId::new(99)).await.unwrap_err();
    assert_eq!(err, ApiError::service("not_found", "session not found"));
}

#[tokio::test]
async fn non_envelope_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/library/leaderboard"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_leaderboard(QuizId::new(1)).await.unwrap_err();
    assert_eq!(err.code(), "invalid_response");
    assert!(err.message().contains("502"));
}

#[tokio::test]
async fn question_without_options_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/library/session/41/current"))
        .respond_with(ok(json!({
            "finished": false,
            "question_id": 9,
            "question": "Empty?",
            "options": [],
            "index": 0,
            "total": 1
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_current(SessionId::new(41)).await.unwrap_err();
    assert_eq!(err.code(), "invalid_response");
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    // Reserve a port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/api", listener.local_addr().unwrap());
    drop(listener);

    let client = HttpSessionClient::new(SessionClientConfig::new(base));
    let err = client
        .create_session(QuizId::new(1), &PlayerName::guest())
        .await
        .unwrap_err();
    assert!(err.is_network());
    assert_eq!(err.code(), "network_error");
}
