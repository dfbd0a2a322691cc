// src/handlers/attempts.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Extension, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptWithQuiz, QuizAttempt},
        quiz::Quiz,
    },
    store::Store,
    utils::jwt::Claims,
};

/// Joins attempts against the quiz list for a display title.
///
/// Attempts are never cascaded when a quiz is deleted, so the quiz reference
/// may dangle; such rows resolve to "Unknown Quiz" instead of failing.
fn resolve_quiz_titles(attempts: Vec<QuizAttempt>, quizzes: Vec<Quiz>) -> Vec<AttemptWithQuiz> {
    let titles: HashMap<String, String> =
        quizzes.into_iter().map(|q| (q.id, q.title)).collect();

    attempts
        .into_iter()
        .map(|attempt| {
            let quiz_title = titles
                .get(&attempt.quiz_id)
                .cloned()
                .unwrap_or_else(|| "Unknown Quiz".to_string());
            AttemptWithQuiz {
                attempt,
                quiz_title,
            }
        })
        .collect()
}

/// Lists every attempt with its quiz title resolved, newest first.
/// Admin only (the results dashboard).
pub async fn list_attempts(State(store): State<Store>) -> Result<impl IntoResponse, AppError> {
    let attempts = store.attempts.list().await?;
    let quizzes = store.quizzes.list().await?;

    Ok(Json(resolve_quiz_titles(attempts, quizzes)))
}

/// Lists the calling user's own attempts, newest first (the history page).
pub async fn list_my_attempts(
    State(store): State<Store>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = store.attempts.list_by_user(&claims.sub).await?;
    let quizzes = store.quizzes.list().await?;

    Ok(Json(resolve_quiz_titles(attempts, quizzes)))
}
