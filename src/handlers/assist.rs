// src/handlers/assist.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{ai::QuizAi, error::AppError, store::Store};

/// DTO for the summarize operation.
#[derive(Debug, Deserialize, Validate)]
pub struct SummarizeRequest {
    #[validate(length(min = 1))]
    pub lesson_text: String,
}

/// Condenses lesson text into a summary. Admin tool; also used as a preview
/// before the lesson is actually stored.
pub async fn summarize(
    State(ai): State<Arc<dyn QuizAi>>,
    Json(payload): Json<SummarizeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let digest = ai.summarize(&payload.lesson_text).await?;

    Ok(Json(digest))
}

/// DTO for the image extraction operation.
#[derive(Debug, Deserialize)]
pub struct ExtractQuestionsRequest {
    /// Base64 data URI with a MIME prefix: `data:image/...;base64,...`.
    pub image_data_uri: String,
}

/// Extracts quiz questions from an uploaded image via the vision model.
/// Admin tool feeding the AI quiz-creation form.
pub async fn extract_questions(
    State(ai): State<Arc<dyn QuizAi>>,
    Json(payload): Json<ExtractQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    crate::ai::validate_image_data_uri(&payload.image_data_uri)?;

    let questions = ai.extract_questions(&payload.image_data_uri).await?;

    Ok(Json(questions))
}

/// DTO for the explanation operation.
#[derive(Debug, Deserialize, Validate)]
pub struct ExplainRequest {
    #[validate(length(min = 1))]
    pub question: String,
    #[validate(length(min = 1))]
    pub correct_answer: String,
    /// The answer the user actually chose, when it was wrong; the
    /// explanation then addresses why the correct answer is preferable.
    pub user_answer: Option<String>,
}

/// Explains the correct answer to a quiz question, grounded in the stored
/// lesson summaries.
pub async fn explain(
    State(store): State<Store>,
    State(ai): State<Arc<dyn QuizAi>>,
    Json(payload): Json<ExplainRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // All lesson summaries together serve as context for the explanation.
    let lessons = store.lessons.list().await?;
    let lesson_context = lessons
        .iter()
        .map(|l| format!("Title: {}\n{}", l.title, l.summary))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    let explanation = ai
        .explain(
            &payload.question,
            &payload.correct_answer,
            payload.user_answer.as_deref(),
            &lesson_context,
        )
        .await?;

    Ok(Json(explanation))
}
