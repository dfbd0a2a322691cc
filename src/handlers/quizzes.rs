// src/handlers/quizzes.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::quiz::{CreateQuizRequest, PublicQuiz, QuizSummary},
    store::Store,
    utils::jwt::Claims,
};

/// Lists all quizzes, newest first, as summaries (question bodies withheld).
pub async fn list_quizzes(State(store): State<Store>) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.quizzes.list().await?;
    let summaries: Vec<QuizSummary> = quizzes.iter().map(QuizSummary::from).collect();

    Ok(Json(summaries))
}

/// Retrieves a single quiz by ID.
///
/// Admins get the full document; everyone else gets the public view with the
/// correct answer indexes withheld (taking happens through the session API).
pub async fn get_quiz(
    State(store): State<Store>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let quiz = store
        .quizzes
        .get(&id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if claims.principal().is_admin(&config.admin_email) {
        Ok(Json(quiz).into_response())
    } else {
        Ok(Json(PublicQuiz::from(&quiz)).into_response())
    }
}

/// Creates a new quiz.
/// Admin only. The store assigns the id and creation timestamp.
pub async fn create_quiz(
    State(store): State<Store>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = store.quizzes.create(payload.into_new_quiz()).await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Deletes a quiz by ID.
/// Admin only. Hard delete: existing attempts keep their dangling reference.
pub async fn delete_quiz(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !store.quizzes.delete(&id).await? {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
