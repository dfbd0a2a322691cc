// src/models/lesson.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A stored lesson summary: the AI-condensed version of uploaded study text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSummary {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub original_file_name: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Lesson data as handed to the store; the adapter assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub title: String,
    pub summary: String,
    pub original_file_name: String,
}

/// DTO for the admin upload-and-summarize action. The raw lesson text is
/// summarized through the AI service; only the summary is persisted.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(min = 1, max = 255))]
    pub original_file_name: String,
}
