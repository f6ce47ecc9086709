use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque chat-user identifier, as delivered by the transport.
pub type UserId = i64;

/// Field key under which the researcher's chat id may be stored inside
/// the interview fields map (legacy records keep it there instead of the
/// top-level column).
pub const RESEARCHER_ID_FIELD: &str = "researcher_chat_id";

/// Field key for an optional reward payload shown to respondents.
pub const REWARD_LINK_FIELD: &str = "reward_link";

/// Field key for the respondent-facing instruction when mirrored into
/// the fields map.
pub const INSTRUCTION_FIELD: &str = "instruction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Draft,
    InProgress,
    Completed,
}

/// An interview study owned by a researcher. Created as `Draft`, moved to
/// `InProgress` exactly once when field collection finalizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    pub id: Uuid,
    pub status: InterviewStatus,
    pub fields: Map<String, Value>,
    pub instruction: Option<String>,
    pub researcher_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Interview {
    /// Resolve the researcher's chat id: top-level column first, then the
    /// fields map. String-typed ids are coerced to numeric form; a value
    /// that cannot be coerced counts as not found.
    pub fn researcher_chat_id(&self) -> Option<UserId> {
        if let Some(id) = self.researcher_id {
            return Some(id);
        }
        coerce_chat_id(self.fields.get(RESEARCHER_ID_FIELD))
    }

    /// Respondent-facing instruction: top-level column, falling back to
    /// the copy kept in the fields map.
    pub fn instruction_text(&self) -> Option<&str> {
        self.instruction
            .as_deref()
            .or_else(|| self.fields.get(INSTRUCTION_FIELD).and_then(Value::as_str))
    }

    pub fn reward_link(&self) -> Option<&str> {
        self.fields.get(REWARD_LINK_FIELD).and_then(Value::as_str)
    }
}

fn coerce_chat_id(value: Option<&Value>) -> Option<UserId> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => match s.trim().parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(raw = %s, "researcher id is not numeric, treating as absent");
                None
            }
        },
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    Researcher,
    Respondent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// One question/answer exchange. Ask order is preserved by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Durable record of one conversation instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub role: SessionRole,
    pub interview_id: Option<Uuid>,
    pub status: SessionStatus,
    pub answers: Vec<QaPair>,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for an interview record. `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct InterviewPatch {
    pub status: Option<InterviewStatus>,
    pub fields: Option<Map<String, Value>>,
    pub instruction: Option<String>,
    pub researcher_id: Option<UserId>,
}

/// Partial update for a session record.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub answers: Option<Vec<QaPair>>,
    pub summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interview_with_fields(fields: Map<String, Value>) -> Interview {
        Interview {
            id: Uuid::new_v4(),
            status: InterviewStatus::InProgress,
            fields,
            instruction: None,
            researcher_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn researcher_id_prefers_top_level() {
        let mut fields = Map::new();
        fields.insert(RESEARCHER_ID_FIELD.into(), json!(111));
        let mut interview = interview_with_fields(fields);
        interview.researcher_id = Some(222);
        assert_eq!(interview.researcher_chat_id(), Some(222));
    }

    #[test]
    fn researcher_id_found_in_nested_fields() {
        let mut fields = Map::new();
        fields.insert(RESEARCHER_ID_FIELD.into(), json!(12345));
        let interview = interview_with_fields(fields);
        assert_eq!(interview.researcher_chat_id(), Some(12345));
    }

    #[test]
    fn researcher_id_coerces_string_values() {
        let mut fields = Map::new();
        fields.insert(RESEARCHER_ID_FIELD.into(), json!(" 6789 "));
        let interview = interview_with_fields(fields);
        assert_eq!(interview.researcher_chat_id(), Some(6789));
    }

    #[test]
    fn researcher_id_coercion_failure_is_not_found() {
        let mut fields = Map::new();
        fields.insert(RESEARCHER_ID_FIELD.into(), json!("not-a-number"));
        let interview = interview_with_fields(fields);
        assert_eq!(interview.researcher_chat_id(), None);
    }

    #[test]
    fn instruction_falls_back_to_fields_map() {
        let mut fields = Map::new();
        fields.insert(INSTRUCTION_FIELD.into(), json!("talk to SMB owners"));
        let interview = interview_with_fields(fields);
        assert_eq!(interview.instruction_text(), Some("talk to SMB owners"));
    }
}
