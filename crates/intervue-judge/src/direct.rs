use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use intervue_store::QaPair;

use crate::prompts::JudgePrompts;
use crate::quality::{NextQuestion, QualityVerdict};
use crate::traits::{EvaluationInput, Judge, JudgeError, NextQuestionInput, Transcriber};

const SYSTEM_PROMPT: &str =
    "You are the language-model backend of a customer-development interview bot. \
     Follow the task in the user message exactly and return only what it asks for.";

// OpenAI-compatible chat completions wire types.

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Judge backed by a direct OpenAI-compatible chat-completions endpoint.
pub struct DirectJudge {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl DirectJudge {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn chat(&self, prompt: String) -> Result<String, JudgeError> {
        let body = ChatRequest {
            model: self.model.clone(),
            temperature: 0.7,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(JudgeError::EmptyResponse);
        }

        debug!(response_len = content.len(), model = %self.model, "chat completion received");
        Ok(content)
    }
}

#[async_trait]
impl Judge for DirectJudge {
    async fn evaluate_answer(
        &self,
        input: EvaluationInput<'_>,
    ) -> Result<QualityVerdict, JudgeError> {
        let output = self.chat(JudgePrompts::build_evaluation_prompt(input)).await?;
        Ok(QualityVerdict::parse(&output)?)
    }

    async fn generate_clarification(
        &self,
        field: &str,
        question: &str,
        answer: &str,
        missing_aspects: &[String],
    ) -> Result<String, JudgeError> {
        let prompt =
            JudgePrompts::build_clarification_prompt(field, question, answer, missing_aspects);
        Ok(self.chat(prompt).await?.trim().to_string())
    }

    async fn generate_brief(&self, fields: &Map<String, Value>) -> Result<String, JudgeError> {
        self.chat(JudgePrompts::build_brief_prompt(fields)).await
    }

    async fn generate_instruction(
        &self,
        fields: &Map<String, Value>,
    ) -> Result<String, JudgeError> {
        Ok(self
            .chat(JudgePrompts::build_instruction_prompt(fields))
            .await?
            .trim()
            .to_string())
    }

    async fn first_question(&self, instruction: &str, style: &str) -> Result<String, JudgeError> {
        let prompt = JudgePrompts::build_first_question_prompt(instruction, style);
        Ok(self.chat(prompt).await?.trim().to_string())
    }

    async fn next_question(
        &self,
        input: NextQuestionInput<'_>,
    ) -> Result<NextQuestion, JudgeError> {
        let output = self
            .chat(JudgePrompts::build_next_question_prompt(input))
            .await?;
        Ok(NextQuestion::from_response(&output))
    }

    async fn summarize(&self, answers: &[QaPair]) -> Result<String, JudgeError> {
        self.chat(JudgePrompts::build_summary_prompt(answers)).await
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Speech-to-text over an OpenAI-compatible audio transcription endpoint.
pub struct AudioTranscriber {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AudioTranscriber {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Transcriber for AudioTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, JudgeError> {
        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("voice.ogg")
            .mime_str("audio/ogg")
            .map_err(|e| JudgeError::Transport(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;
        Ok(parsed.text)
    }
}
