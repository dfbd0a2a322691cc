// tests/session_flow_tests.rs

use std::net::SocketAddr;
use std::sync::Arc;

use quizmaster_backend::{
    ai::{AnswerExplanation, ExtractedQuestions, LessonDigest, QuizAi},
    config::Config,
    error::AppError,
    models::{
        attempt::{NewAttempt, QuizAttempt},
        user::Principal,
    },
    routes,
    session::SessionRegistry,
    state::AppState,
    store::{AttemptStore, Store},
    utils::jwt::sign_jwt,
};

const TEST_SECRET: &str = "session_flow_test_secret";
const ADMIN_EMAIL: &str = "admin@example.com";

struct NoopAi;

#[async_trait::async_trait]
impl QuizAi for NoopAi {
    async fn summarize(&self, _lesson_text: &str) -> Result<LessonDigest, AppError> {
        Ok(LessonDigest {
            summary: "unused".to_string(),
        })
    }

    async fn extract_questions(
        &self,
        _image_data_uri: &str,
    ) -> Result<ExtractedQuestions, AppError> {
        Ok(ExtractedQuestions { questions: vec![] })
    }

    async fn explain(
        &self,
        _question: &str,
        _correct_answer: &str,
        _user_answer: Option<&str>,
        _lesson_context: &str,
    ) -> Result<AnswerExplanation, AppError> {
        Ok(AnswerExplanation {
            explanation: "unused".to_string(),
        })
    }
}

/// An attempt store whose writes always fail, for exercising the
/// non-fatal-save path on finish.
struct FailingAttemptStore;

#[async_trait::async_trait]
impl AttemptStore for FailingAttemptStore {
    async fn list(&self) -> Result<Vec<QuizAttempt>, AppError> {
        Ok(vec![])
    }

    async fn list_by_user(&self, _user_id: &str) -> Result<Vec<QuizAttempt>, AppError> {
        Ok(vec![])
    }

    async fn get(&self, _id: &str) -> Result<Option<QuizAttempt>, AppError> {
        Ok(None)
    }

    async fn create(&self, _new: NewAttempt) -> Result<String, AppError> {
        Err(AppError::InternalServerError(
            "attempt write rejected".to_string(),
        ))
    }
}

async fn spawn_app() -> String {
    spawn_app_with_store(Store::in_memory()).await
}

async fn spawn_app_with_store(store: Store) -> String {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration: 600,
        admin_email: ADMIN_EMAIL.to_string(),
        rust_log: "error".to_string(),
        openai_api_key: "test-key".to_string(),
        openai_base_url: "http://127.0.0.1:1".to_string(),
        openai_model: "test-model".to_string(),
        openai_vision_model: "test-vision-model".to_string(),
        tokeninfo_url: "http://127.0.0.1:1".to_string(),
    };

    let state = AppState {
        store,
        config,
        ai: Arc::new(NoopAi),
        sessions: SessionRegistry::new(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    address
}

fn token_for(email: &str, name: &str) -> String {
    let principal = Principal {
        id: format!("uid-{}", email),
        name: name.to_string(),
        email: email.to_string(),
        avatar_url: None,
    };
    sign_jwt(&principal, TEST_SECRET, 600).unwrap()
}

/// Seeds a two-question quiz through the admin API and returns its id.
async fn seed_quiz(address: &str, client: &reqwest::Client) -> String {
    let created = client
        .post(format!("{}/api/quizzes", address))
        .header("Authorization", format!("Bearer {}", token_for(ADMIN_EMAIL, "Admin")))
        .json(&serde_json::json!({
            "title": "Astronomy",
            "description": "The solar system",
            "questions": [
                {
                    "question_text": "Which planet is known as the Red Planet?",
                    "answers": ["Venus", "Mars", "Jupiter"],
                    "correct_answer_index": 1
                },
                {
                    "question_text": "What is the closest star to Earth?",
                    "answers": ["The Sun", "Proxima Centauri"],
                    "correct_answer_index": 0
                }
            ]
        }))
        .send()
        .await
        .expect("Failed to create quiz");
    assert_eq!(created.status().as_u16(), 201);

    created.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn starting_a_session_for_a_missing_quiz_is_not_found() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/sessions", address))
        .header("Authorization", format!("Bearer {}", token_for("user@example.com", "User")))
        .json(&serde_json::json!({ "quiz_id": "does-not-exist" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn full_quiz_flow_scores_and_persists_one_attempt() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&address, &client).await;
    let token = token_for("taker@example.com", "Quiz Taker");

    // Start: position 0, first question visible, answer key withheld.
    let started = client
        .post(format!("{}/api/sessions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "quiz_id": quiz_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(started.status().as_u16(), 201);
    let view: serde_json::Value = started.json().await.unwrap();
    assert_eq!(view["state"], "in_progress");
    assert_eq!(view["question_index"], 0);
    assert_eq!(view["total_questions"], 2);
    assert!(view["question"].get("correct_answer_index").is_none());
    let session_id = view["session_id"].as_str().unwrap().to_string();

    // Answer question 1 correctly (Mars), after first picking wrong and
    // re-selecting; the overwrite must win.
    for answer in [0, 1] {
        let response = client
            .post(format!("{}/api/sessions/{}/answer", address, session_id))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({ "answer_index": answer }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    // Retreat on the first question stays on the first question.
    let retreated: serde_json::Value = client
        .post(format!("{}/api/sessions/{}/retreat", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(retreated["question_index"], 0);

    // Advance to question 2 and answer it wrong.
    let moved: serde_json::Value = client
        .post(format!("{}/api/sessions/{}/advance", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(moved["state"], "in_progress");
    assert_eq!(moved["question_index"], 1);

    client
        .post(format!("{}/api/sessions/{}/answer", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answer_index": 1 }))
        .send()
        .await
        .unwrap();

    // Advancing on the last question finishes: 1 of 2 correct = 50.
    let finished: serde_json::Value = client
        .post(format!("{}/api/sessions/{}/advance", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(finished["state"], "finished");
    assert_eq!(finished["score"], 50);
    assert_eq!(finished["correct_count"], 1);
    assert!(finished["time_taken_secs"].as_i64().unwrap() >= 0);
    assert!(finished["attempt_id"].is_string());
    assert!(finished.get("save_error").is_none());

    // Advancing again returns the same outcome and saves nothing new.
    let again: serde_json::Value = client
        .post(format!("{}/api/sessions/{}/advance", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["state"], "finished");
    assert_eq!(again["score"], 50);
    assert!(again.get("attempt_id").is_none());

    // Exactly one attempt in the taker's history, with the quiz title.
    let mine: Vec<serde_json::Value> = client
        .get(format!("{}/api/attempts/mine", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["score"], 50);
    assert_eq!(mine[0]["quiz_title"], "Astronomy");
    assert_eq!(mine[0]["answers"][0]["selected_answer_index"], 1);

    // The admin results view sees it too.
    let all: Vec<serde_json::Value> = client
        .get(format!("{}/api/attempts", address))
        .header("Authorization", format!("Bearer {}", token_for(ADMIN_EMAIL, "Admin")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["user_name"], "Quiz Taker");
}

#[tokio::test]
async fn unanswered_questions_score_zero_and_record_the_sentinel() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&address, &client).await;
    let token = token_for("skipper@example.com", "Skipper");

    let started: serde_json::Value = client
        .post(format!("{}/api/sessions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "quiz_id": quiz_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = started["session_id"].as_str().unwrap().to_string();

    // Skip straight through without answering anything.
    client
        .post(format!("{}/api/sessions/{}/advance", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    let finished: serde_json::Value = client
        .post(format!("{}/api/sessions/{}/advance", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(finished["state"], "finished");
    assert_eq!(finished["score"], 0);

    let mine: Vec<serde_json::Value> = client
        .get(format!("{}/api/attempts/mine", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine[0]["answers"][0]["selected_answer_index"], serde_json::Value::Null);
}

#[tokio::test]
async fn deleting_a_quiz_leaves_attempts_listing_as_unknown() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&address, &client).await;
    let token = token_for("taker@example.com", "Quiz Taker");

    // Complete the quiz once.
    let started: serde_json::Value = client
        .post(format!("{}/api/sessions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "quiz_id": quiz_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = started["session_id"].as_str().unwrap().to_string();
    for _ in 0..2 {
        client
            .post(format!("{}/api/sessions/{}/advance", address, session_id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .unwrap();
    }

    // Admin deletes the quiz out from under the attempt.
    let deleted = client
        .delete(format!("{}/api/quizzes/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token_for(ADMIN_EMAIL, "Admin")))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    // The attempt survives and renders with the fallback title.
    let mine: Vec<serde_json::Value> = client
        .get(format!("{}/api/attempts/mine", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["quiz_title"], "Unknown Quiz");
}

#[tokio::test]
async fn a_failed_attempt_save_still_shows_the_score() {
    let mut store = Store::in_memory();
    store.attempts = Arc::new(FailingAttemptStore);
    let address = spawn_app_with_store(store).await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&address, &client).await;
    let token = token_for("taker@example.com", "Quiz Taker");

    let started: serde_json::Value = client
        .post(format!("{}/api/sessions", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "quiz_id": quiz_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = started["session_id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/api/sessions/{}/advance", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    let finished = client
        .post(format!("{}/api/sessions/{}/advance", address, session_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    // The write failed, yet the user still gets their score and a non-fatal
    // submission error.
    assert_eq!(finished.status().as_u16(), 200);
    let body: serde_json::Value = finished.json().await.unwrap();
    assert_eq!(body["state"], "finished");
    assert_eq!(body["score"], 0);
    assert!(body.get("attempt_id").is_none());
    assert!(body["save_error"].is_string());
}

#[tokio::test]
async fn sessions_are_private_to_their_owner() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&address, &client).await;

    let started: serde_json::Value = client
        .post(format!("{}/api/sessions", address))
        .header("Authorization", format!("Bearer {}", token_for("owner@example.com", "Owner")))
        .json(&serde_json::json!({ "quiz_id": quiz_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = started["session_id"].as_str().unwrap().to_string();

    let other = client
        .get(format!("{}/api/sessions/{}", address, session_id))
        .header("Authorization", format!("Bearer {}", token_for("other@example.com", "Other")))
        .send()
        .await
        .unwrap();
    assert_eq!(other.status().as_u16(), 404);
}
