use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Map, Value};
use tokio::time::timeout;
use tracing::{info, warn};

use intervue_judge::{EvaluationInput, QualityVerdict};
use intervue_store::{
    InterviewPatch, InterviewStatus, SpeakerRole, UserId, RESEARCHER_ID_FIELD,
};

use crate::config::EngineConfig;
use crate::error::FlowError;
use crate::fields::{FieldPlan, FieldSpec, FINALIZE_MIN_LEN};
use crate::intents::IntentLexicon;
use crate::messages;
use crate::session::IntakeSession;
use crate::traits::Collaborators;
use crate::validator::{validate, ValidationResult};

/// Quality-gated field collection for researchers setting up an interview.
///
/// One session per user. Each turn clones the session out of the map,
/// works on the clone, and writes it back, so judge calls never run
/// under the session lock.
pub struct IntakeFlow {
    collaborators: Collaborators,
    plan: FieldPlan,
    lexicon: IntentLexicon,
    config: EngineConfig,
    sessions: Mutex<HashMap<UserId, IntakeSession>>,
}

impl IntakeFlow {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        Self {
            collaborators,
            plan: FieldPlan::default(),
            lexicon: IntentLexicon::default(),
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_plan(mut self, plan: FieldPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn has_session(&self, user: UserId) -> bool {
        self.lock_sessions().contains_key(&user)
    }

    /// Begin field collection: create the draft record and ask the first
    /// question. Replaces any intake already in flight for this user.
    pub async fn start(&self, user: UserId) -> Result<(), FlowError> {
        let mut seed = Map::new();
        seed.insert(RESEARCHER_ID_FIELD.to_string(), json!(user));

        let interview = match self.collaborators.store.create_interview(seed).await {
            Ok(interview) => interview,
            Err(e) => {
                warn!(user, error = %e, "failed to create draft interview");
                self.send(user, messages::SETUP_FAILED).await?;
                return Ok(());
            }
        };

        let memory_key = format!("researcher_{}_{}", user, interview.id);
        let mut session = IntakeSession::new(interview.id, memory_key);

        let first = match self.plan.get(0) {
            Some(field) => field.prompt.clone(),
            None => return Ok(()),
        };
        session.last_question = first.clone();
        self.lock_sessions().insert(user, session);

        info!(user, interview_id = %interview.id, "intake started");
        self.send(user, messages::RESEARCHER_WELCOME).await?;
        self.remember(user, SpeakerRole::Assistant, &first).await;
        self.send(user, &first).await
    }

    /// One researcher turn. No-op error when no intake is in flight.
    pub async fn submit_answer(&self, user: UserId, text: &str) -> Result<(), FlowError> {
        let mut session = self
            .lock_sessions()
            .get(&user)
            .cloned()
            .ok_or(FlowError::NoSession(user))?;

        self.remember_key(&session.memory_key, SpeakerRole::User, text)
            .await;

        let Some(field) = self.plan.get(session.field_index).cloned() else {
            // Every field answered already; any further message finalizes.
            return self.finalize(user, session).await;
        };

        if self.lexicon.is_finish(text) {
            let missing = self.plan.missing_required(&session.collected);
            if missing.is_empty() {
                return self.finalize(user, session).await;
            }
            let prompts: Vec<&str> = missing.iter().map(|f| f.prompt.as_str()).collect();
            let reply = messages::missing_required(&prompts);
            self.remember_key(&session.memory_key, SpeakerRole::Assistant, &reply)
                .await;
            return self.send(user, &reply).await;
        }

        match validate(&field, text, &self.lexicon) {
            ValidationResult::StopWordRejected => {
                let reply = messages::ANSWER_TOO_VAGUE.to_string();
                self.remember_key(&session.memory_key, SpeakerRole::Assistant, &reply)
                    .await;
                return self.send(user, &reply).await;
            }
            ValidationResult::TooShort { min } => {
                let reply = messages::answer_too_short(min);
                self.remember_key(&session.memory_key, SpeakerRole::Assistant, &reply)
                    .await;
                return self.send(user, &reply).await;
            }
            ValidationResult::Ok => {}
        }

        if !field.required && self.lexicon.wants_skip(text) {
            session.awaiting_clarification = false;
            return self.advance(user, session, true, text).await;
        }

        let verdict = self.evaluate(&field, &session.last_question, text).await;

        if verdict.is_complete {
            let value = verdict
                .extracted_value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| text.to_string());
            session.collected.insert(field.name.clone(), json!(value));
            session.awaiting_clarification = false;
            return self.advance(user, session, true, text).await;
        }

        if !session.awaiting_clarification {
            session.awaiting_clarification = true;
            let clarification = self
                .clarify(&field, &session.last_question, text, &verdict.missing_aspects)
                .await;
            session.last_question = clarification.clone();
            self.lock_sessions().insert(user, session.clone());
            self.remember_key(&session.memory_key, SpeakerRole::Assistant, &clarification)
                .await;
            return self.send(user, &clarification).await;
        }

        // Second verdict on this field is terminal: accept what we have
        // when the judge saw any substance, otherwise reject and stay put.
        if verdict.confidence > 0.0 || verdict.extracted_value.is_some() {
            let value = verdict
                .extracted_value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| text.to_string());
            session.collected.insert(field.name.clone(), json!(value));
            session.awaiting_clarification = false;
            return self.advance(user, session, false, text).await;
        }

        session.awaiting_clarification = false;
        self.lock_sessions().insert(user, session.clone());
        let reply = messages::rejection_keep_or_skip(&field.prompt);
        self.remember_key(&session.memory_key, SpeakerRole::Assistant, &reply)
            .await;
        self.send(user, &reply).await
    }

    /// Voice turn: transcribe and feed through the text path.
    pub async fn submit_voice(&self, user: UserId, audio: &[u8]) -> Result<(), FlowError> {
        match self.collaborators.transcriber.transcribe(audio).await {
            Ok(text) => self.submit_answer(user, &text).await,
            Err(e) => {
                warn!(user, error = %e, "transcription failed");
                self.send(user, messages::TRANSCRIPTION_FAILED).await
            }
        }
    }

    pub async fn cancel(&self, user: UserId) -> Result<(), FlowError> {
        if self.lock_sessions().remove(&user).is_some() {
            info!(user, "intake cancelled");
            self.send(user, messages::SESSION_CANCELLED).await?;
        }
        Ok(())
    }

    /// Move to the next unanswered field and ask its question. When
    /// `scan_skip` is set and the same answer also reads as a skip,
    /// consecutive optional fields are passed over in one turn.
    async fn advance(
        &self,
        user: UserId,
        mut session: IntakeSession,
        scan_skip: bool,
        answer: &str,
    ) -> Result<(), FlowError> {
        session.field_index += 1;
        if scan_skip && self.lexicon.wants_skip(answer) {
            while let Some(next) = self.plan.get(session.field_index) {
                if next.required {
                    break;
                }
                session.field_index += 1;
            }
        }

        match self.plan.get(session.field_index) {
            Some(next) => {
                session.last_question = next.prompt.clone();
                let question = next.prompt.clone();
                let key = session.memory_key.clone();
                self.lock_sessions().insert(user, session);
                self.remember_key(&key, SpeakerRole::Assistant, &question)
                    .await;
                self.send(user, &question).await
            }
            None => self.finalize(user, session).await,
        }
    }

    /// Re-validate, generate the brief, extract the instruction, and
    /// publish the interview. Failure here always clears the session and
    /// leaves the record in draft.
    async fn finalize(&self, user: UserId, session: IntakeSession) -> Result<(), FlowError> {
        let bad: Vec<&FieldSpec> = self
            .plan
            .required_fields()
            .filter(|f| {
                let value = session
                    .collected
                    .get(&f.name)
                    .and_then(Value::as_str)
                    .unwrap_or("");
                self.lexicon.is_garbage_value(value)
                    || (f.critical && value.trim().chars().count() < FINALIZE_MIN_LEN)
            })
            .collect();

        if !bad.is_empty() {
            self.lock_sessions().remove(&user);
            let prompts: Vec<&str> = bad.iter().map(|f| f.prompt.as_str()).collect();
            return self
                .send(user, &messages::finalize_validation_failed(&prompts))
                .await;
        }

        let brief = match timeout(
            self.config.generation_timeout,
            self.collaborators.judge.generate_brief(&session.collected),
        )
        .await
        {
            Ok(Ok(brief)) => brief,
            Ok(Err(e)) => {
                warn!(user, error = %e, "brief generation failed");
                self.lock_sessions().remove(&user);
                return self.send(user, messages::BRIEF_GENERATION_FAILED).await;
            }
            Err(_) => {
                warn!(user, "brief generation timed out");
                self.lock_sessions().remove(&user);
                return self.send(user, messages::BRIEF_GENERATION_FAILED).await;
            }
        };

        let instruction = match extract_instruction(&brief, &self.config.instruction_marker) {
            Some(instruction) => instruction,
            None => {
                match timeout(
                    self.config.generation_timeout,
                    self.collaborators
                        .judge
                        .generate_instruction(&session.collected),
                )
                .await
                {
                    Ok(Ok(instruction)) => instruction,
                    Ok(Err(e)) => {
                        warn!(user, error = %e, "instruction generation failed");
                        self.lock_sessions().remove(&user);
                        return self.send(user, messages::BRIEF_GENERATION_FAILED).await;
                    }
                    Err(_) => {
                        warn!(user, "instruction generation timed out");
                        self.lock_sessions().remove(&user);
                        return self.send(user, messages::BRIEF_GENERATION_FAILED).await;
                    }
                }
            }
        };

        let mut fields = session.collected.clone();
        fields.insert(RESEARCHER_ID_FIELD.to_string(), json!(user));

        let patch = InterviewPatch {
            status: Some(InterviewStatus::InProgress),
            fields: Some(fields),
            instruction: Some(instruction),
            researcher_id: Some(user),
        };
        if let Err(e) = self
            .collaborators
            .store
            .update_interview(session.interview_id, patch)
            .await
        {
            warn!(user, error = %e, "failed to publish interview");
            self.lock_sessions().remove(&user);
            return self.send(user, messages::BRIEF_GENERATION_FAILED).await;
        }

        self.lock_sessions().remove(&user);

        let name = session
            .collected
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("researcher");
        let token = format!("interview_{}", session.interview_id);
        let link = format!("{}{}", self.config.share_link_base, token);

        info!(user, interview_id = %session.interview_id, "interview published");
        self.send(user, &messages::research_created(name, &link))
            .await?;
        self.send(user, &brief).await
    }

    /// Judge failures and timeouts read as a rejection with nothing
    /// extractable, so the turn degrades to a clarification.
    async fn evaluate(&self, field: &FieldSpec, question: &str, answer: &str) -> QualityVerdict {
        let input = EvaluationInput {
            field: &field.name,
            field_description: &field.description,
            question,
            answer,
        };
        match timeout(
            self.config.judge_timeout,
            self.collaborators.judge.evaluate_answer(input),
        )
        .await
        {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                warn!(field = %field.name, error = %e, "answer evaluation failed");
                QualityVerdict::rejected()
            }
            Err(_) => {
                warn!(field = %field.name, "answer evaluation timed out");
                QualityVerdict::rejected()
            }
        }
    }

    async fn clarify(
        &self,
        field: &FieldSpec,
        question: &str,
        answer: &str,
        missing: &[String],
    ) -> String {
        match timeout(
            self.config.judge_timeout,
            self.collaborators
                .judge
                .generate_clarification(&field.name, question, answer, missing),
        )
        .await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) | Err(_) => messages::CLARIFICATION_FALLBACK.to_string(),
            Ok(Err(e)) => {
                warn!(field = %field.name, error = %e, "clarification generation failed");
                messages::CLARIFICATION_FALLBACK.to_string()
            }
        }
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, IntakeSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn send(&self, user: UserId, text: &str) -> Result<(), FlowError> {
        self.collaborators.transport.send_text(user, text).await?;
        Ok(())
    }

    async fn remember(&self, user: UserId, role: SpeakerRole, text: &str) {
        let key = self
            .lock_sessions()
            .get(&user)
            .map(|s| s.memory_key.clone());
        if let Some(key) = key {
            self.remember_key(&key, role, text).await;
        }
    }

    async fn remember_key(&self, key: &str, role: SpeakerRole, text: &str) {
        self.collaborators.memory.append(key, role, text).await;
    }
}

/// Pull the respondent-facing first message out of a generated brief.
/// The marker heading starts the section; it runs to the next heading or
/// the end of the document.
pub fn extract_instruction(brief: &str, marker: &str) -> Option<String> {
    let start = brief.find(marker)?;
    let after = &brief[start + marker.len()..];
    let mut lines = Vec::new();
    for line in after.lines() {
        if line.trim_start().starts_with("###") {
            break;
        }
        lines.push(line);
    }
    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
