// src/handlers/lessons.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    ai::QuizAi,
    error::AppError,
    models::lesson::{CreateLessonRequest, NewLesson},
    store::Store,
    utils::html::clean_html,
};

/// Lists all lesson summaries, newest first.
pub async fn list_lessons(State(store): State<Store>) -> Result<impl IntoResponse, AppError> {
    let lessons = store.lessons.list().await?;
    Ok(Json(lessons))
}

/// The admin upload-and-summarize action: sanitize the uploaded lesson text,
/// condense it through the AI service, persist the summary.
///
/// An AI failure aborts the whole action; nothing is stored and the error is
/// reported to the caller.
pub async fn create_lesson(
    State(store): State<Store>,
    State(ai): State<Arc<dyn QuizAi>>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let content = clean_html(&payload.content);
    let digest = ai.summarize(&content).await?;

    let id = store
        .lessons
        .create(NewLesson {
            title: payload.title,
            summary: digest.summary.clone(),
            original_file_name: payload.original_file_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": id,
            "summary": digest.summary,
        })),
    ))
}

/// Deletes a lesson summary by ID.
/// Admin only.
pub async fn delete_lesson(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !store.lessons.delete(&id).await? {
        return Err(AppError::NotFound("Lesson not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
