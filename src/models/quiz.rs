// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single question embedded in a quiz.
///
/// Questions are not independently addressable; they live inside their quiz
/// document and their `id` is only unique within it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    pub question_text: String,

    /// Optional URL to an illustration shown with the question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Ordered answer options. Always at least two.
    pub answers: Vec<String>,

    /// Index into `answers`. Invariant: `correct_answer_index < answers.len()`.
    pub correct_answer_index: usize,
}

/// A quiz document: a named, ordered collection of questions.
/// Immutable after creation except full delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Quiz data as handed to the store; the adapter assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
}

/// DTO for sending a question to a quiz taker (excludes the correct index).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub question_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub answers: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            id: q.id.clone(),
            question_text: q.question_text.clone(),
            image: q.image.clone(),
            answers: q.answers.clone(),
        }
    }
}

/// List-view DTO: question bodies are withheld, only the count is exposed.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub question_count: usize,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        QuizSummary {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            question_count: quiz.questions.len(),
            created_at: quiz.created_at,
        }
    }
}

/// Full quiz with answer keys withheld, for non-admin readers.
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<PublicQuestion>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        PublicQuiz {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            questions: quiz.questions.iter().map(PublicQuestion::from).collect(),
            created_at: quiz.created_at,
        }
    }
}

/// DTO for one question inside a quiz creation request.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_correct_index))]
pub struct CreateQuestionRequest {
    /// Client-side id, kept when present; assigned server-side otherwise.
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,
    #[validate(custom(function = validate_image_url))]
    pub image: Option<String>,
    #[validate(custom(function = validate_answers))]
    pub answers: Vec<String>,
    pub correct_answer_index: usize,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(length(min = 1, message = "A quiz needs at least one question."), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

impl CreateQuizRequest {
    /// Converts the validated request into store input, assigning an id to
    /// every question that arrived without one.
    pub fn into_new_quiz(self) -> NewQuiz {
        let questions = self
            .questions
            .into_iter()
            .map(|q| Question {
                id: q
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                question_text: q.question_text,
                image: q.image,
                answers: q.answers,
                correct_answer_index: q.correct_answer_index,
            })
            .collect();

        NewQuiz {
            title: self.title,
            description: self.description,
            questions,
        }
    }
}

fn validate_answers(answers: &[String]) -> Result<(), validator::ValidationError> {
    if answers.len() < 2 {
        return Err(validator::ValidationError::new(
            "question_needs_two_answers",
        ));
    }
    for ans in answers {
        if ans.is_empty() || ans.len() > 500 {
            return Err(validator::ValidationError::new("answer_length_invalid"));
        }
    }
    Ok(())
}

fn validate_image_url(image: &str) -> Result<(), validator::ValidationError> {
    let parsed =
        url::Url::parse(image).map_err(|_| validator::ValidationError::new("invalid_image_url"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(validator::ValidationError::new("invalid_image_url_scheme"));
    }
    Ok(())
}

fn validate_correct_index(req: &CreateQuestionRequest) -> Result<(), validator::ValidationError> {
    if req.correct_answer_index >= req.answers.len() {
        return Err(validator::ValidationError::new(
            "correct_answer_index_out_of_range",
        ));
    }
    Ok(())
}
