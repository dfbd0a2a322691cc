// src/session.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use uuid::Uuid;

use crate::models::{
    attempt::AnswerRecord,
    quiz::{Question, Quiz},
};

/// Scores a finished answer sheet against the quiz's questions.
///
/// An unanswered slot never matches. The percentage is rounded over the
/// actual question count of the quiz being scored.
/// Returns (correct_count, score).
pub fn score_answers(answers: &[Option<usize>], questions: &[Question]) -> (usize, i64) {
    let total = questions.len();
    if total == 0 {
        return (0, 0);
    }

    let correct = questions
        .iter()
        .zip(answers.iter())
        .filter(|(q, slot)| **slot == Some(q.correct_answer_index))
        .count();

    let score = (correct as f64 / total as f64 * 100.0).round() as i64;
    (correct, score)
}

/// The terminal result of a session. Computed exactly once.
#[derive(Debug, Clone)]
pub struct FinishedOutcome {
    pub score: i64,
    pub correct_count: usize,
    pub time_taken_secs: i64,
    pub responses: Vec<AnswerRecord>,
}

/// Result of `advance()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the question at this index.
    Moved(usize),
    /// The session is finished. `first` is true only on the advance that
    /// performed the transition; callers persist the attempt on that one.
    Finished { first: bool },
}

/// One user's traversal of a quiz's ordered question list.
///
/// `InProgress(position, answers)` until the final `advance()`, then
/// `Finished(outcome)`. There is no abandoned state: dropping the session
/// discards in-memory progress.
pub struct QuizSession {
    quiz: Quiz,
    user_id: String,
    user_name: String,
    position: usize,
    answers: Vec<Option<usize>>,
    started_at: Instant,
    outcome: Option<FinishedOutcome>,
}

impl QuizSession {
    /// Starts a session over a fetched quiz: one unset answer slot per
    /// question, position zero, start time recorded.
    pub fn new(quiz: Quiz, user_id: String, user_name: String) -> Self {
        let slots = quiz.questions.len();
        QuizSession {
            quiz,
            user_id,
            user_name,
            position: 0,
            answers: vec![None; slots],
            started_at: Instant::now(),
            outcome: None,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total_questions(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions.get(self.position)
    }

    pub fn selected_answer(&self) -> Option<usize> {
        self.answers.get(self.position).copied().flatten()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&FinishedOutcome> {
        self.outcome.as_ref()
    }

    /// Sets the selected answer for the current question only. Re-selecting
    /// overwrites the previous choice. Ignored once finished.
    pub fn select_answer(&mut self, answer_index: usize) {
        if self.outcome.is_some() {
            return;
        }
        if let Some(slot) = self.answers.get_mut(self.position) {
            *slot = Some(answer_index);
        }
    }

    /// Moves to the next question, or finishes when already on the last one.
    /// Finishing is idempotent: the outcome is computed on the first
    /// finishing advance and only handed back on later calls.
    pub fn advance(&mut self) -> Advance {
        if self.outcome.is_some() {
            return Advance::Finished { first: false };
        }

        if self.position + 1 < self.quiz.questions.len() {
            self.position += 1;
            return Advance::Moved(self.position);
        }

        let (correct_count, score) = score_answers(&self.answers, &self.quiz.questions);
        let responses = self
            .quiz
            .questions
            .iter()
            .zip(self.answers.iter())
            .map(|(q, slot)| AnswerRecord {
                question_id: q.id.clone(),
                selected_answer_index: *slot,
            })
            .collect();

        self.outcome = Some(FinishedOutcome {
            score,
            correct_count,
            time_taken_secs: self.started_at.elapsed().as_secs() as i64,
            responses,
        });

        Advance::Finished { first: true }
    }

    /// Moves back one question; a no-op on the first question or once
    /// finished.
    pub fn retreat(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        self.position = self.position.saturating_sub(1);
    }
}

/// In-memory registry of live sessions. Sessions are local to one user's
/// traversal; there is no autosave and no resume after a restart.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<Uuid, QuizSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: QuizSession) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .lock()
            .expect("session registry poisoned")
            .insert(id, session);
        id
    }

    /// Runs `f` against the session, if it exists and belongs to `user_id`.
    pub fn with_session<R>(
        &self,
        id: Uuid,
        user_id: &str,
        f: impl FnOnce(&mut QuizSession) -> R,
    ) -> Option<R> {
        let mut sessions = self.inner.lock().expect("session registry poisoned");
        let session = sessions.get_mut(&id).filter(|s| s.user_id() == user_id)?;
        Some(f(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, correct: usize) -> Question {
        Question {
            id: id.to_string(),
            question_text: format!("Question {}", id),
            image: None,
            answers: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            correct_answer_index: correct,
        }
    }

    fn quiz(questions: Vec<Question>) -> Quiz {
        Quiz {
            id: "quiz-1".to_string(),
            title: "Test Quiz".to_string(),
            description: String::new(),
            questions,
            created_at: None,
        }
    }

    fn session(questions: Vec<Question>) -> QuizSession {
        QuizSession::new(quiz(questions), "user-1".to_string(), "User One".to_string())
    }

    #[test]
    fn all_correct_scores_100() {
        let mut s = session(vec![question("1", 0), question("2", 1), question("3", 2)]);
        for answer in [0, 1, 2] {
            s.select_answer(answer);
            s.advance();
        }
        assert_eq!(s.outcome().unwrap().score, 100);
        assert_eq!(s.outcome().unwrap().correct_count, 3);
    }

    #[test]
    fn all_wrong_scores_0() {
        let mut s = session(vec![question("1", 0), question("2", 0)]);
        for _ in 0..2 {
            s.select_answer(1);
            s.advance();
        }
        assert_eq!(s.outcome().unwrap().score, 0);
    }

    #[test]
    fn all_unanswered_scores_0() {
        let mut s = session(vec![question("1", 0), question("2", 1)]);
        s.advance();
        s.advance();
        let outcome = s.outcome().unwrap();
        assert_eq!(outcome.score, 0);
        assert!(
            outcome
                .responses
                .iter()
                .all(|r| r.selected_answer_index.is_none())
        );
    }

    #[test]
    fn two_of_three_rounds_to_67() {
        let mut s = session(vec![question("1", 0), question("2", 0), question("3", 0)]);
        s.select_answer(0);
        s.advance();
        s.select_answer(0);
        s.advance();
        s.select_answer(1); // wrong
        s.advance();
        assert_eq!(s.outcome().unwrap().score, 67);
    }

    #[test]
    fn unanswered_slot_never_matches() {
        // Question 2 left unanswered; only question 1 counts.
        let mut s = session(vec![question("1", 0), question("2", 0)]);
        s.select_answer(0);
        s.advance();
        s.advance();
        let outcome = s.outcome().unwrap();
        assert_eq!(outcome.correct_count, 1);
        assert_eq!(outcome.score, 50);
    }

    #[test]
    fn retreat_at_first_question_stays_put() {
        let mut s = session(vec![question("1", 0), question("2", 0)]);
        s.retreat();
        assert_eq!(s.position(), 0);
        s.advance();
        s.retreat();
        s.retreat();
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn reselecting_overwrites_previous_choice() {
        let mut s = session(vec![question("1", 2)]);
        s.select_answer(0);
        s.select_answer(2);
        s.advance();
        assert_eq!(s.outcome().unwrap().score, 100);
    }

    #[test]
    fn finish_happens_exactly_once() {
        let mut s = session(vec![question("1", 0), question("2", 1)]);
        s.select_answer(0);
        s.advance();
        s.select_answer(1);

        assert_eq!(s.advance(), Advance::Finished { first: true });
        let score = s.outcome().unwrap().score;

        // Advancing again must not rescore or flip the transition flag.
        assert_eq!(s.advance(), Advance::Finished { first: false });
        assert_eq!(s.outcome().unwrap().score, score);
        assert_eq!(score, 100);
    }

    #[test]
    fn select_after_finish_is_ignored() {
        let mut s = session(vec![question("1", 0)]);
        s.advance();
        s.select_answer(0);
        assert_eq!(s.advance(), Advance::Finished { first: false });
        assert_eq!(s.outcome().unwrap().score, 0);
    }

    #[test]
    fn elapsed_time_is_non_negative() {
        let mut s = session(vec![question("1", 0)]);
        s.advance();
        assert!(s.outcome().unwrap().time_taken_secs >= 0);
    }

    #[test]
    fn score_over_empty_question_list_is_zero() {
        let (correct, score) = score_answers(&[], &[]);
        assert_eq!(correct, 0);
        assert_eq!(score, 0);
    }

    #[test]
    fn registry_scopes_sessions_to_their_owner() {
        let registry = SessionRegistry::new();
        let id = registry.insert(session(vec![question("1", 0)]));

        assert!(registry.with_session(id, "user-1", |s| s.position()).is_some());
        assert!(registry.with_session(id, "user-2", |s| s.position()).is_none());
        assert!(
            registry
                .with_session(Uuid::new_v4(), "user-1", |s| s.position())
                .is_none()
        );
    }
}
