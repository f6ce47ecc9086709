use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The judge's verdict on whether an answer fully covers a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub is_complete: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub missing_aspects: Vec<String>,
    #[serde(default)]
    pub extracted_value: Option<String>,
}

#[derive(Error, Debug)]
pub enum QualityParseError {
    #[error("no JSON object found in judge output")]
    NoJsonFound,

    #[error("failed to parse verdict JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

impl QualityVerdict {
    /// The safe default when the judge cannot be consulted: incomplete,
    /// zero confidence, nothing extracted. Failure is never treated as
    /// acceptance.
    pub fn rejected() -> Self {
        Self {
            is_complete: false,
            confidence: 0.0,
            missing_aspects: Vec::new(),
            extracted_value: None,
        }
    }

    /// Parse a verdict from raw LLM output.
    ///
    /// Models wrap the JSON in markdown fences or prepend prose, so the
    /// parser strips fences and falls back to scanning for the outermost
    /// brace pair before giving up.
    pub fn parse(output: &str) -> Result<Self, QualityParseError> {
        debug!(output_len = output.len(), "parsing quality verdict");

        let content = strip_code_fences(output.trim());

        let json_str = if content.starts_with('{') {
            content
        } else {
            let start = content.find('{').ok_or(QualityParseError::NoJsonFound)?;
            let end = content.rfind('}').ok_or(QualityParseError::NoJsonFound)?;
            if start >= end {
                return Err(QualityParseError::NoJsonFound);
            }
            &content[start..=end]
        };

        let mut verdict: QualityVerdict = serde_json::from_str(json_str)?;
        verdict.confidence = verdict.confidence.clamp(0.0, 1.0);
        Ok(verdict)
    }
}

fn strip_code_fences(content: &str) -> &str {
    let content = content
        .strip_prefix("```json")
        .or_else(|| content.strip_prefix("```"))
        .unwrap_or(content);
    content.strip_suffix("```").unwrap_or(content).trim()
}

/// Sentinel the question generator emits when it considers the interview
/// covered. Checked against the trimmed, upper-cased response body.
pub const FINISH_SENTINEL: &str = "FINISH";

/// Outcome of a next-question generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextQuestion {
    Ask(String),
    Finish,
}

impl NextQuestion {
    /// Interpret raw generator output: the FINISH sentinel (or an empty
    /// body) signals completion, anything else is the next question.
    pub fn from_response(output: &str) -> Self {
        let trimmed = output.trim();
        if trimmed.is_empty() || trimmed.to_uppercase() == FINISH_SENTINEL {
            NextQuestion::Finish
        } else {
            NextQuestion::Ask(trimmed.to_string())
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, NextQuestion::Finish)
    }
}
