// src/store/memory.rs

//! In-memory adapters with the same contract as the Postgres ones. Used as
//! the local dev backend and as the test double for the integration suite.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    attempt::{NewAttempt, QuizAttempt},
    lesson::{LessonSummary, NewLesson},
    quiz::{NewQuiz, Quiz},
};

use super::{AttemptStore, LessonStore, QuizStore};

#[derive(Default)]
pub struct MemoryQuizStore {
    // Newest first; creation inserts at the front so ordering matches the
    // created_at DESC contract even within one timestamp tick.
    items: RwLock<Vec<Quiz>>,
}

#[async_trait]
impl QuizStore for MemoryQuizStore {
    async fn list(&self) -> Result<Vec<Quiz>, AppError> {
        Ok(self.items.read().expect("quiz store poisoned").clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Quiz>, AppError> {
        Ok(self
            .items
            .read()
            .expect("quiz store poisoned")
            .iter()
            .find(|q| q.id == id)
            .cloned())
    }

    async fn create(&self, new: NewQuiz) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        let quiz = Quiz {
            id: id.clone(),
            title: new.title,
            description: new.description,
            questions: new.questions,
            created_at: Some(Utc::now()),
        };
        self.items
            .write()
            .expect("quiz store poisoned")
            .insert(0, quiz);
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut items = self.items.write().expect("quiz store poisoned");
        let before = items.len();
        items.retain(|q| q.id != id);
        Ok(items.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryLessonStore {
    items: RwLock<Vec<LessonSummary>>,
}

#[async_trait]
impl LessonStore for MemoryLessonStore {
    async fn list(&self) -> Result<Vec<LessonSummary>, AppError> {
        Ok(self.items.read().expect("lesson store poisoned").clone())
    }

    async fn get(&self, id: &str) -> Result<Option<LessonSummary>, AppError> {
        Ok(self
            .items
            .read()
            .expect("lesson store poisoned")
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn create(&self, new: NewLesson) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        let lesson = LessonSummary {
            id: id.clone(),
            title: new.title,
            summary: new.summary,
            original_file_name: new.original_file_name,
            created_at: Some(Utc::now()),
        };
        self.items
            .write()
            .expect("lesson store poisoned")
            .insert(0, lesson);
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut items = self.items.write().expect("lesson store poisoned");
        let before = items.len();
        items.retain(|l| l.id != id);
        Ok(items.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryAttemptStore {
    items: RwLock<Vec<QuizAttempt>>,
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn list(&self) -> Result<Vec<QuizAttempt>, AppError> {
        Ok(self.items.read().expect("attempt store poisoned").clone())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<QuizAttempt>, AppError> {
        Ok(self
            .items
            .read()
            .expect("attempt store poisoned")
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<QuizAttempt>, AppError> {
        Ok(self
            .items
            .read()
            .expect("attempt store poisoned")
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn create(&self, new: NewAttempt) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        let attempt = QuizAttempt {
            id: id.clone(),
            quiz_id: new.quiz_id,
            user_id: new.user_id,
            user_name: new.user_name,
            score: new.score,
            time_taken_secs: new.time_taken_secs,
            answers: new.answers,
            submitted_at: Some(Utc::now()),
        };
        self.items
            .write()
            .expect("attempt store poisoned")
            .insert(0, attempt);
        Ok(id)
    }
}
