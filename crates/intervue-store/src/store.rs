use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{
    Interview, InterviewPatch, InterviewStatus, SessionPatch, SessionRecord, SessionRole,
    SessionStatus, UserId,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("interview {0} not found")]
    InterviewNotFound(Uuid),

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Key-value style persistence for interview and session records.
///
/// The engine only needs create/get/update per record id; the backing
/// format is the implementation's business.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_interview(&self, fields: Map<String, Value>) -> Result<Interview, StoreError>;

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, StoreError>;

    async fn update_interview(
        &self,
        id: Uuid,
        patch: InterviewPatch,
    ) -> Result<Interview, StoreError>;

    async fn create_session(
        &self,
        user_id: UserId,
        role: SessionRole,
        interview_id: Option<Uuid>,
    ) -> Result<SessionRecord, StoreError>;

    async fn update_session(
        &self,
        id: Uuid,
        patch: SessionPatch,
    ) -> Result<SessionRecord, StoreError>;
}

/// Process-local store. The reference backend for tests and local runs;
/// deployments swap in a store backed by their database of choice.
#[derive(Default)]
pub struct InMemoryStore {
    interviews: Mutex<HashMap<Uuid, Interview>>,
    sessions: Mutex<HashMap<Uuid, SessionRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn create_interview(&self, fields: Map<String, Value>) -> Result<Interview, StoreError> {
        let interview = Interview {
            id: Uuid::new_v4(),
            status: InterviewStatus::Draft,
            fields,
            instruction: None,
            researcher_id: None,
            created_at: Utc::now(),
        };
        self.interviews
            .lock()
            .expect("interview map poisoned")
            .insert(interview.id, interview.clone());
        Ok(interview)
    }

    async fn get_interview(&self, id: Uuid) -> Result<Option<Interview>, StoreError> {
        Ok(self
            .interviews
            .lock()
            .expect("interview map poisoned")
            .get(&id)
            .cloned())
    }

    async fn update_interview(
        &self,
        id: Uuid,
        patch: InterviewPatch,
    ) -> Result<Interview, StoreError> {
        let mut map = self.interviews.lock().expect("interview map poisoned");
        let interview = map
            .get_mut(&id)
            .ok_or(StoreError::InterviewNotFound(id))?;
        if let Some(status) = patch.status {
            interview.status = status;
        }
        if let Some(fields) = patch.fields {
            interview.fields = fields;
        }
        if let Some(instruction) = patch.instruction {
            interview.instruction = Some(instruction);
        }
        if let Some(researcher_id) = patch.researcher_id {
            interview.researcher_id = Some(researcher_id);
        }
        Ok(interview.clone())
    }

    async fn create_session(
        &self,
        user_id: UserId,
        role: SessionRole,
        interview_id: Option<Uuid>,
    ) -> Result<SessionRecord, StoreError> {
        let now = Utc::now();
        let record = SessionRecord {
            id: Uuid::new_v4(),
            user_id,
            role,
            interview_id,
            status: SessionStatus::Active,
            answers: Vec::new(),
            summary: None,
            created_at: now,
            updated_at: now,
        };
        self.sessions
            .lock()
            .expect("session map poisoned")
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_session(
        &self,
        id: Uuid,
        patch: SessionPatch,
    ) -> Result<SessionRecord, StoreError> {
        let mut map = self.sessions.lock().expect("session map poisoned");
        let record = map.get_mut(&id).ok_or(StoreError::SessionNotFound(id))?;
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(answers) = patch.answers {
            record.answers = answers;
        }
        if let Some(summary) = patch.summary {
            record.summary = Some(summary);
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}
