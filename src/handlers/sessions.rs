// src/handlers/sessions.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{attempt::NewAttempt, quiz::PublicQuestion},
    session::{Advance, QuizSession, SessionRegistry},
    store::Store,
    utils::jwt::Claims,
};

/// Client view of a live or finished session. While in progress, only the
/// current question is exposed and correct answers are withheld.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub state: &'static str,
    pub question_index: usize,
    pub total_questions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<PublicQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_answer_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_secs: Option<i64>,
}

fn session_view(id: Uuid, session: &QuizSession) -> SessionView {
    match session.outcome() {
        Some(outcome) => SessionView {
            session_id: id.to_string(),
            quiz_id: session.quiz().id.clone(),
            quiz_title: session.quiz().title.clone(),
            state: "finished",
            question_index: session.position(),
            total_questions: session.total_questions(),
            question: None,
            selected_answer_index: None,
            score: Some(outcome.score),
            correct_count: Some(outcome.correct_count),
            time_taken_secs: Some(outcome.time_taken_secs),
        },
        None => SessionView {
            session_id: id.to_string(),
            quiz_id: session.quiz().id.clone(),
            quiz_title: session.quiz().title.clone(),
            state: "in_progress",
            question_index: session.position(),
            total_questions: session.total_questions(),
            question: session.current_question().map(PublicQuestion::from),
            selected_answer_index: session.selected_answer(),
            score: None,
            correct_count: None,
            time_taken_secs: None,
        },
    }
}

/// DTO for starting a session.
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub quiz_id: String,
}

/// Starts a quiz session for the calling user.
///
/// A missing quiz is a plain not-found outcome: no session is created and
/// the client redirects to its dashboard.
pub async fn start_session(
    State(store): State<Store>,
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store
        .quizzes
        .get(&payload.quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if quiz.questions.is_empty() {
        return Err(AppError::BadRequest(
            "Quiz has no questions to take".to_string(),
        ));
    }

    let session = QuizSession::new(quiz, claims.sub.clone(), claims.name.clone());
    let view = {
        let id = sessions.insert(session);
        sessions
            .with_session(id, &claims.sub, |s| session_view(id, s))
            .ok_or_else(|| AppError::InternalServerError("Session vanished".to_string()))?
    };

    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the current state of a session. Sessions are visible only to
/// their owner.
pub async fn get_session(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = sessions
        .with_session(id, &claims.sub, |s| session_view(id, s))
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    Ok(Json(view))
}

/// DTO for answering the current question.
#[derive(Debug, Deserialize)]
pub struct SelectAnswerRequest {
    pub answer_index: usize,
}

/// Selects (or re-selects) the answer for the current question.
/// Does not advance position.
pub async fn select_answer(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = sessions
        .with_session(id, &claims.sub, |s| {
            s.select_answer(payload.answer_index);
            session_view(id, s)
        })
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    Ok(Json(view))
}

/// Advance response: the session view, plus the attempt-save outcome on the
/// finishing step. A persistence failure never hides the score; it is
/// reported as a non-fatal submission error.
#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    #[serde(flatten)]
    pub view: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

/// Moves to the next question, or finishes when on the last one.
///
/// Exactly one attempt is persisted per session: only the advance that
/// performs the `Finished` transition writes, repeat calls just return the
/// already-computed outcome.
pub async fn advance(
    State(store): State<Store>,
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (view, new_attempt) = sessions
        .with_session(id, &claims.sub, |s| {
            let step = s.advance();
            let new_attempt = match (step, s.outcome()) {
                (Advance::Finished { first: true }, Some(outcome)) => Some(NewAttempt {
                    quiz_id: s.quiz().id.clone(),
                    user_id: s.user_id().to_string(),
                    user_name: s.user_name().to_string(),
                    score: outcome.score,
                    time_taken_secs: outcome.time_taken_secs,
                    answers: outcome.responses.clone(),
                }),
                _ => None,
            };
            (session_view(id, s), new_attempt)
        })
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    let mut attempt_id = None;
    let mut save_error = None;

    if let Some(new_attempt) = new_attempt {
        match store.attempts.create(new_attempt).await {
            Ok(id) => attempt_id = Some(id),
            Err(e) => {
                tracing::error!("Failed to save quiz attempt: {:?}", e);
                save_error = Some("Could not save quiz attempt.".to_string());
            }
        }
    }

    Ok(Json(AdvanceResponse {
        view,
        attempt_id,
        save_error,
    }))
}

/// Moves back one question; a no-op on the first question.
pub async fn retreat(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = sessions
        .with_session(id, &claims.sub, |s| {
            s.retreat();
            session_view(id, s)
        })
        .ok_or(AppError::NotFound("Session not found".to_string()))?;

    Ok(Json(view))
}
