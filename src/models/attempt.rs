// src/models/attempt.rs

use serde::{Deserialize, Serialize};

/// One per-question response inside an attempt. `None` means the question
/// was left unanswered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: String,
    pub selected_answer_index: Option<usize>,
}

/// The persisted record of one completed quiz session.
/// Written exactly once; never mutated or deleted through the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: String,
    /// References a quiz by id only. The quiz may have been deleted since;
    /// readers must tolerate the dangling reference.
    pub quiz_id: String,
    pub user_id: String,
    pub user_name: String,
    /// Percentage in [0, 100].
    pub score: i64,
    /// Whole seconds between session start and finish.
    pub time_taken_secs: i64,
    pub answers: Vec<AnswerRecord>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Attempt data as handed to the store; the adapter assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub quiz_id: String,
    pub user_id: String,
    pub user_name: String,
    pub score: i64,
    pub time_taken_secs: i64,
    pub answers: Vec<AnswerRecord>,
}

/// Results-view row: an attempt with its quiz title resolved.
/// Falls back to "Unknown Quiz" when the quiz no longer exists.
#[derive(Debug, Serialize)]
pub struct AttemptWithQuiz {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub quiz_title: String,
}
