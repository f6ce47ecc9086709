use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use intervue_store::{QaPair, SpeakerRole};

use crate::quality::{NextQuestion, QualityVerdict};
use crate::traits::{EvaluationInput, Judge, JudgeError, NextQuestionInput};

/// Orchestrator verdict payload. The remote side scores 0-10; the
/// contract wants confidence in [0, 1].
#[derive(Deserialize, Default)]
struct RemoteVerdict {
    #[serde(default)]
    field_complete: bool,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    missing_aspects: Vec<String>,
}

#[derive(Deserialize)]
struct RemoteEnvelope {
    #[serde(default)]
    result: Option<RemoteVerdict>,
    #[serde(default)]
    text: Option<String>,
}

/// Judge backed by a remote workflow orchestrator: every operation is a
/// typed POST to a single webhook, which owns the prompts and the model.
pub struct RemoteJudge {
    client: reqwest::Client,
    webhook_url: String,
    api_key: String,
}

impl RemoteJudge {
    pub fn new(webhook_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn call(&self, payload: Value) -> Result<RemoteEnvelope, JudgeError> {
        debug!(op = payload.get("type").and_then(serde_json::Value::as_str), "calling orchestrator webhook");

        let response = self
            .client
            .post(&self.webhook_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
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

        response
            .json()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))
    }

    async fn call_for_text(&self, payload: Value) -> Result<String, JudgeError> {
        let envelope = self.call(payload).await?;
        let text = envelope.text.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(JudgeError::EmptyResponse);
        }
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl Judge for RemoteJudge {
    async fn evaluate_answer(
        &self,
        input: EvaluationInput<'_>,
    ) -> Result<QualityVerdict, JudgeError> {
        let envelope = self
            .call(json!({
                "type": "evaluate_answer",
                "field": input.field,
                "field_description": input.field_description,
                "question": input.question,
                "answer": input.answer,
            }))
            .await?;

        let remote = envelope.result.unwrap_or_default();
        Ok(QualityVerdict {
            is_complete: remote.field_complete,
            confidence: (remote.score / 10.0).clamp(0.0, 1.0),
            missing_aspects: remote.missing_aspects,
            extracted_value: remote
                .field_complete
                .then(|| input.answer.to_string()),
        })
    }

    async fn generate_clarification(
        &self,
        field: &str,
        question: &str,
        answer: &str,
        missing_aspects: &[String],
    ) -> Result<String, JudgeError> {
        self.call_for_text(json!({
            "type": "generate_clarification",
            "field": field,
            "question": question,
            "answer": answer,
            "missing_aspects": missing_aspects,
        }))
        .await
    }

    async fn generate_brief(&self, fields: &Map<String, Value>) -> Result<String, JudgeError> {
        self.call_for_text(json!({
            "type": "generate_brief",
            "fields": fields,
        }))
        .await
    }

    async fn generate_instruction(
        &self,
        fields: &Map<String, Value>,
    ) -> Result<String, JudgeError> {
        self.call_for_text(json!({
            "type": "generate_instruction",
            "fields": fields,
        }))
        .await
    }

    async fn first_question(&self, instruction: &str, style: &str) -> Result<String, JudgeError> {
        self.call_for_text(json!({
            "type": "first_question",
            "instruction": instruction,
            "style": style,
        }))
        .await
    }

    async fn next_question(
        &self,
        input: NextQuestionInput<'_>,
    ) -> Result<NextQuestion, JudgeError> {
        let history: Vec<Value> = input
            .history
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        SpeakerRole::User => "user",
                        SpeakerRole::Assistant => "assistant",
                    },
                    "text": m.text,
                })
            })
            .collect();

        let text = self
            .call_for_text(json!({
                "type": "next_question",
                "instruction": input.instruction,
                "answers": input.answers,
                "answers_count": input.answers.len(),
                "history": history,
                "style": input.style,
            }))
            .await?;
        Ok(NextQuestion::from_response(&text))
    }

    async fn summarize(&self, answers: &[QaPair]) -> Result<String, JudgeError> {
        self.call_for_text(json!({
            "type": "generate_summary",
            "answers": answers,
            "answers_count": answers.len(),
        }))
        .await
    }
}
