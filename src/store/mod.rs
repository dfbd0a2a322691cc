// src/store/mod.rs

//! Narrow per-entity repositories over the external document store.
//!
//! Each entity family gets one trait with the four operations the
//! application needs; concrete adapters are injected as trait objects. The
//! Postgres adapter is the hosted backend, the in-memory adapter is the
//! local/dev backend and the integration-test double.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{
    attempt::{NewAttempt, QuizAttempt},
    lesson::{LessonSummary, NewLesson},
    quiz::{NewQuiz, Quiz},
};

/// Quiz collection. Creation stamps the server time; delete is hard and does
/// not cascade into attempts.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// All quizzes, newest first. An empty collection is not an error.
    async fn list(&self) -> Result<Vec<Quiz>, AppError>;
    async fn get(&self, id: &str) -> Result<Option<Quiz>, AppError>;
    /// Returns the assigned identifier.
    async fn create(&self, new: NewQuiz) -> Result<String, AppError>;
    /// Returns false when the id did not exist.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

/// Lesson-summary collection.
#[async_trait]
pub trait LessonStore: Send + Sync {
    async fn list(&self) -> Result<Vec<LessonSummary>, AppError>;
    async fn get(&self, id: &str) -> Result<Option<LessonSummary>, AppError>;
    async fn create(&self, new: NewLesson) -> Result<String, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

/// Attempt collection. Write-once: no update or delete surface.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn list(&self) -> Result<Vec<QuizAttempt>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<QuizAttempt>, AppError>;
    async fn get(&self, id: &str) -> Result<Option<QuizAttempt>, AppError>;
    async fn create(&self, new: NewAttempt) -> Result<String, AppError>;
}

/// The three injected repositories, bundled for `AppState`.
#[derive(Clone)]
pub struct Store {
    pub quizzes: Arc<dyn QuizStore>,
    pub lessons: Arc<dyn LessonStore>,
    pub attempts: Arc<dyn AttemptStore>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Store {
            quizzes: Arc::new(postgres::PgQuizStore::new(pool.clone())),
            lessons: Arc::new(postgres::PgLessonStore::new(pool.clone())),
            attempts: Arc::new(postgres::PgAttemptStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Store {
            quizzes: Arc::new(memory::MemoryQuizStore::default()),
            lessons: Arc::new(memory::MemoryLessonStore::default()),
            attempts: Arc::new(memory::MemoryAttemptStore::default()),
        }
    }
}
