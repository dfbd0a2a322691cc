// src/ai.rs

//! Generative AI client for the three assist operations: summarize lesson
//! text, extract quiz questions from an image, explain an answer.
//!
//! Each operation is one blocking round trip against an OpenAI-compatible
//! chat-completions endpoint requesting a strict JSON object. The response is
//! deserialized against a fixed schema; a mismatch surfaces as an explicit
//! `AppError::AiService`, never a silently coerced default. Retries, if any,
//! are the external service's concern.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::{config::Config, error::AppError};

const SUMMARIZE_SYSTEM: &str = "You summarize lesson content for students. \
Extract the key concepts and main ideas. \
Respond with a JSON object: {\"summary\": \"...\"}.";

const EXTRACT_SYSTEM: &str = "You are an AI quiz generator. You will receive an image \
containing quiz questions. Extract the questions, possible answers, and identify the \
correct answer index. Respond with a JSON object: \
{\"questions\": [{\"question_text\": \"...\", \"answers\": [\"...\"], \"correct_answer_index\": 0}]}.";

const EXPLAIN_SYSTEM: &str = "You explain the correct answer to a quiz question, \
clearly and concisely, using the provided lesson content where it helps. \
Respond with a JSON object: {\"explanation\": \"...\"}.";

/// Output schema of `summarize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDigest {
    pub summary: String,
}

/// One question extracted from an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedQuestion {
    pub question_text: String,
    pub answers: Vec<String>,
    pub correct_answer_index: usize,
}

/// Output schema of `extract_questions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedQuestions {
    pub questions: Vec<ExtractedQuestion>,
}

/// Output schema of `explain`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerExplanation {
    pub explanation: String,
}

/// The three stateless assist operations. Implemented by the OpenAI client
/// in production and by stubs in the test suite.
#[async_trait]
pub trait QuizAi: Send + Sync {
    async fn summarize(&self, lesson_text: &str) -> Result<LessonDigest, AppError>;

    /// `image_data_uri` must be a base64 data URI with a MIME prefix
    /// (`data:image/...;base64,...`); callers check it with
    /// [`validate_image_data_uri`] before the round trip.
    async fn extract_questions(&self, image_data_uri: &str)
    -> Result<ExtractedQuestions, AppError>;

    async fn explain(
        &self,
        question: &str,
        correct_answer: &str,
        user_answer: Option<&str>,
        lesson_context: &str,
    ) -> Result<AnswerExplanation, AppError>;
}

/// Checks the `data:image/<subtype>;base64,<payload>` shape of an uploaded
/// image before it is sent anywhere.
pub fn validate_image_data_uri(input: &str) -> Result<(), AppError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^data:image/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/]+=*$")
            .expect("data URI regex")
    });

    if re.is_match(input) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Expected a base64 image data URI (data:image/...;base64,...)".to_string(),
        ))
    }
}

/// Deserializes a model response against the fixed output schema.
/// A missing or mistyped field is a reportable failure, not a default.
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, AppError> {
    serde_json::from_str::<T>(content).map_err(|e| {
        AppError::AiService(format!("AI response did not match the expected schema: {}", e))
    })
}

fn validate_extracted(output: &ExtractedQuestions) -> Result<(), AppError> {
    for q in &output.questions {
        if q.answers.len() < 2 || q.correct_answer_index >= q.answers.len() {
            return Err(AppError::AiService(format!(
                "AI produced an invalid question: {} answers, correct index {}",
                q.answers.len(),
                q.correct_answer_index
            )));
        }
    }
    Ok(())
}

/// OpenAI-compatible chat-completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    vision_model: String,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            model: config.openai_model.clone(),
            vision_model: config.openai_vision_model.clone(),
        })
    }

    /// JSON-object chat completion, generic over the target schema.
    async fn chat_json<T: DeserializeOwned>(
        &self,
        model: &str,
        system: &str,
        user_content: MessageContent,
    ) -> Result<T, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessageReq {
                    role: "system".to_string(),
                    content: MessageContent::Text(system.to_string()),
                },
                ChatMessageReq {
                    role: "user".to_string(),
                    content: user_content,
                },
            ],
            temperature: 0.2,
            response_format: Some(ResponseFormat {
                r#type: "json_object".to_string(),
            }),
        };

        let res = self
            .client
            .post(&url)
            .header(USER_AGENT, "quizmaster-backend/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await
            .map_err(|e| AppError::AiService(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            let msg = extract_api_error(&body).unwrap_or(body);
            return Err(AppError::AiService(format!("AI HTTP {}: {}", status, msg)));
        }

        let body: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| AppError::AiService(e.to_string()))?;

        if let Some(usage) = &body.usage {
            tracing::info!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                "AI usage"
            );
        }

        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        parse_structured(&text)
    }
}

#[async_trait]
impl QuizAi for OpenAiClient {
    async fn summarize(&self, lesson_text: &str) -> Result<LessonDigest, AppError> {
        let user = format!(
            "Summarize the following lesson content, extracting the key concepts and main ideas:\n\n{}",
            lesson_text
        );
        self.chat_json(&self.model, SUMMARIZE_SYSTEM, MessageContent::Text(user))
            .await
    }

    async fn extract_questions(
        &self,
        image_data_uri: &str,
    ) -> Result<ExtractedQuestions, AppError> {
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: "Extract the quiz questions from this image.".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image_data_uri.to_string(),
                },
            },
        ]);

        let output: ExtractedQuestions = self
            .chat_json(&self.vision_model, EXTRACT_SYSTEM, content)
            .await?;
        validate_extracted(&output)?;
        Ok(output)
    }

    async fn explain(
        &self,
        question: &str,
        correct_answer: &str,
        user_answer: Option<&str>,
        lesson_context: &str,
    ) -> Result<AnswerExplanation, AppError> {
        let mut user = format!(
            "Here is the question:\n{}\n\nHere is the correct answer:\n{}\n",
            question, correct_answer
        );
        if let Some(chosen) = user_answer {
            user.push_str(&format!(
                "\nThe user chose: {}\nExplain why the correct answer is better.\n",
                chosen
            ));
        }
        user.push_str(&format!(
            "\nHere is some lesson content that may be helpful in your explanation:\n{}",
            lesson_context
        ));

        self.chat_json(&self.model, EXPLAIN_SYSTEM, MessageContent::Text(user))
            .await
    }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessageReq>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessageReq {
    role: String,
    content: MessageContent,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    r#type: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResp,
}

#[derive(Deserialize)]
struct ChatMessageResp {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

/// Try to extract a clean error message from the provider's error body.
fn extract_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct EWrap {
        error: EObj,
    }
    #[derive(Deserialize)]
    struct EObj {
        message: String,
    }
    serde_json::from_str::<EWrap>(body)
        .ok()
        .map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_summary() {
        let digest: LessonDigest =
            parse_structured(r#"{"summary": "Mitochondria produce the cell's energy."}"#).unwrap();
        assert!(!digest.summary.is_empty());
    }

    #[test]
    fn missing_summary_field_is_an_error_not_a_default() {
        let result = parse_structured::<LessonDigest>(r#"{"text": "not the right field"}"#);
        match result {
            Err(AppError::AiService(msg)) => assert!(msg.contains("schema")),
            other => panic!("expected AiService error, got {:?}", other),
        }
    }

    #[test]
    fn parses_extracted_questions() {
        let out: ExtractedQuestions = parse_structured(
            r#"{"questions": [{"question_text": "2+2?", "answers": ["3", "4"], "correct_answer_index": 1}]}"#,
        )
        .unwrap();
        assert_eq!(out.questions.len(), 1);
        assert!(validate_extracted(&out).is_ok());
    }

    #[test]
    fn extracted_question_with_bad_index_is_rejected() {
        let out = ExtractedQuestions {
            questions: vec![ExtractedQuestion {
                question_text: "2+2?".to_string(),
                answers: vec!["3".to_string(), "4".to_string()],
                correct_answer_index: 2,
            }],
        };
        assert!(validate_extracted(&out).is_err());
    }

    #[test]
    fn accepts_a_proper_image_data_uri() {
        assert!(validate_image_data_uri("data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==").is_ok());
    }

    #[test]
    fn rejects_non_image_or_unprefixed_payloads() {
        assert!(validate_image_data_uri("data:text/html;base64,PGI+aGk8L2I+").is_err());
        assert!(validate_image_data_uri("iVBORw0KGgoAAAANSUhEUg==").is_err());
        assert!(validate_image_data_uri("https://example.com/image.png").is_err());
    }
}
