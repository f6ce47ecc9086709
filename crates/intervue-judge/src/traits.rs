use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use intervue_store::{MemoryMessage, QaPair};

use crate::quality::{NextQuestion, QualityParseError, QualityVerdict};

/// Errors from a judge backend. Call sites decide whether a failure is
/// soft (quality evaluation, clarification, question generation) or
/// user-visible (brief, summary).
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("judge request failed: {0}")]
    Transport(String),

    #[error("judge returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("judge returned an empty response")]
    EmptyResponse,

    #[error("failed to parse judge response: {0}")]
    Parse(#[from] QualityParseError),
}

/// Inputs for a single answer-quality evaluation.
#[derive(Clone, Copy)]
pub struct EvaluationInput<'a> {
    pub field: &'a str,
    pub field_description: &'a str,
    pub question: &'a str,
    pub answer: &'a str,
}

/// Inputs for generating the next adaptive interview question.
#[derive(Clone, Copy)]
pub struct NextQuestionInput<'a> {
    pub instruction: &'a str,
    pub answers: &'a [QaPair],
    pub history: &'a [MemoryMessage],
    pub style: &'a str,
}

/// The language-model collaborator behind both conversation flows.
///
/// Implementations are selected at construction time (direct LLM call or
/// remote orchestrator); the state machines only ever see this contract.
/// All operations are plain request/response with no shared mutable
/// state, so callers may retry them freely.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Judge whether an answer fully covers the asked field.
    async fn evaluate_answer(&self, input: EvaluationInput<'_>)
        -> Result<QualityVerdict, JudgeError>;

    /// One follow-up question targeting the missing aspects of an answer.
    async fn generate_clarification(
        &self,
        field: &str,
        question: &str,
        answer: &str,
        missing_aspects: &[String],
    ) -> Result<String, JudgeError>;

    /// Full interview brief from the collected fields. Contains a
    /// discoverable "first message to the respondent" section.
    async fn generate_brief(&self, fields: &Map<String, Value>) -> Result<String, JudgeError>;

    /// Respondent-facing instruction; fallback path when the brief has no
    /// extractable first-message section.
    async fn generate_instruction(&self, fields: &Map<String, Value>)
        -> Result<String, JudgeError>;

    /// Opening question for a respondent interview.
    async fn first_question(&self, instruction: &str, style: &str) -> Result<String, JudgeError>;

    /// Next adaptive question, or the finish signal.
    async fn next_question(&self, input: NextQuestionInput<'_>)
        -> Result<NextQuestion, JudgeError>;

    /// Summary over the full answer map.
    async fn summarize(&self, answers: &[QaPair]) -> Result<String, JudgeError>;
}

/// Speech-to-text collaborator for voice turns.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, JudgeError>;
}
