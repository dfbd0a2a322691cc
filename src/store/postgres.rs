// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    attempt::{AnswerRecord, NewAttempt, QuizAttempt},
    lesson::{LessonSummary, NewLesson},
    quiz::{NewQuiz, Question, Quiz},
};

use super::{AttemptStore, LessonStore, QuizStore};

/// Quizzes table: embedded questions live in a JSONB column, so a quiz reads
/// and writes as one document.
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct QuizRow {
    id: String,
    title: String,
    description: String,
    questions: Json<Vec<Question>>,
    created_at: DateTime<Utc>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Quiz {
            id: row.id,
            title: row.title,
            description: row.description,
            questions: row.questions.0,
            created_at: Some(row.created_at),
        }
    }
}

#[async_trait]
impl QuizStore for PgQuizStore {
    async fn list(&self) -> Result<Vec<Quiz>, AppError> {
        let rows: Vec<QuizRow> = sqlx::query_as(
            "SELECT id, title, description, questions, created_at
             FROM quizzes
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Quiz::from).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Quiz>, AppError> {
        let row: Option<QuizRow> = sqlx::query_as(
            "SELECT id, title, description, questions, created_at
             FROM quizzes
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Quiz::from))
    }

    async fn create(&self, new: NewQuiz) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO quizzes (id, title, description, questions)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(Json(&new.questions))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete quiz: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct PgLessonStore {
    pool: PgPool,
}

impl PgLessonStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct LessonRow {
    id: String,
    title: String,
    summary: String,
    original_file_name: String,
    created_at: DateTime<Utc>,
}

impl From<LessonRow> for LessonSummary {
    fn from(row: LessonRow) -> Self {
        LessonSummary {
            id: row.id,
            title: row.title,
            summary: row.summary,
            original_file_name: row.original_file_name,
            created_at: Some(row.created_at),
        }
    }
}

#[async_trait]
impl LessonStore for PgLessonStore {
    async fn list(&self) -> Result<Vec<LessonSummary>, AppError> {
        let rows: Vec<LessonRow> = sqlx::query_as(
            "SELECT id, title, summary, original_file_name, created_at
             FROM lessons
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LessonSummary::from).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<LessonSummary>, AppError> {
        let row: Option<LessonRow> = sqlx::query_as(
            "SELECT id, title, summary, original_file_name, created_at
             FROM lessons
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LessonSummary::from))
    }

    async fn create(&self, new: NewLesson) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO lessons (id, title, summary, original_file_name)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&id)
        .bind(&new.title)
        .bind(&new.summary)
        .bind(&new.original_file_name)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create lesson: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete lesson: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct PgAttemptStore {
    pool: PgPool,
}

impl PgAttemptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AttemptRow {
    id: String,
    quiz_id: String,
    user_id: String,
    user_name: String,
    score: i64,
    time_taken_secs: i64,
    answers: Json<Vec<AnswerRecord>>,
    submitted_at: DateTime<Utc>,
}

impl From<AttemptRow> for QuizAttempt {
    fn from(row: AttemptRow) -> Self {
        QuizAttempt {
            id: row.id,
            quiz_id: row.quiz_id,
            user_id: row.user_id,
            user_name: row.user_name,
            score: row.score,
            time_taken_secs: row.time_taken_secs,
            answers: row.answers.0,
            submitted_at: Some(row.submitted_at),
        }
    }
}

#[async_trait]
impl AttemptStore for PgAttemptStore {
    async fn list(&self) -> Result<Vec<QuizAttempt>, AppError> {
        let rows: Vec<AttemptRow> = sqlx::query_as(
            "SELECT id, quiz_id, user_id, user_name, score, time_taken_secs, answers, submitted_at
             FROM attempts
             ORDER BY submitted_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuizAttempt::from).collect())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<QuizAttempt>, AppError> {
        let rows: Vec<AttemptRow> = sqlx::query_as(
            "SELECT id, quiz_id, user_id, user_name, score, time_taken_secs, answers, submitted_at
             FROM attempts
             WHERE user_id = $1
             ORDER BY submitted_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(QuizAttempt::from).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<QuizAttempt>, AppError> {
        let row: Option<AttemptRow> = sqlx::query_as(
            "SELECT id, quiz_id, user_id, user_name, score, time_taken_secs, answers, submitted_at
             FROM attempts
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(QuizAttempt::from))
    }

    async fn create(&self, new: NewAttempt) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO attempts (id, quiz_id, user_id, user_name, score, time_taken_secs, answers)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&id)
        .bind(&new.quiz_id)
        .bind(&new.user_id)
        .bind(&new.user_name)
        .bind(new.score)
        .bind(new.time_taken_secs)
        .bind(Json(&new.answers))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save attempt: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(id)
    }
}
