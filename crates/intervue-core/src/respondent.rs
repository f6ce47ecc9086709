use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use intervue_judge::{Judge, NextQuestion, NextQuestionInput};
use intervue_store::{
    InterviewStatus, QaPair, RecordStore, SessionPatch, SessionRole, SessionStatus, SpeakerRole,
    UserId,
};

use crate::config::EngineConfig;
use crate::error::FlowError;
use crate::intents::{extract_style, IntentLexicon};
use crate::messages;
use crate::session::InterviewSession;
use crate::timers::{ReminderStage, TimerCoordinator};
use crate::traits::{ChatTransport, Collaborators};

/// Adaptive respondent interviews: judge-generated questions, an answer
/// floor before the finish signal is honored, milestone reports to the
/// researcher, and inactivity reminders.
pub struct InterviewFlow {
    collaborators: Collaborators,
    lexicon: IntentLexicon,
    config: EngineConfig,
    timers: TimerCoordinator,
    sessions: Mutex<HashMap<UserId, InterviewSession>>,
    /// Fire-and-forget milestone report tasks, aborted on session end.
    interim_tasks: Mutex<HashMap<Uuid, Vec<JoinHandle<()>>>>,
}

impl InterviewFlow {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        Self {
            collaborators,
            lexicon: IntentLexicon::default(),
            config,
            timers: TimerCoordinator::new(),
            sessions: Mutex::new(HashMap::new()),
            interim_tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn has_session(&self, user: UserId) -> bool {
        self.lock_sessions().contains_key(&user)
    }

    /// Respondent entry point. The interview must exist and be open;
    /// a user already mid-interview keeps their current one.
    pub async fn start(&self, user: UserId, interview_id: Uuid) -> Result<(), FlowError> {
        if self.has_session(user) {
            return Ok(());
        }

        let interview = match self.collaborators.store.get_interview(interview_id).await {
            Ok(Some(interview)) => interview,
            Ok(None) => {
                return self.send(user, messages::INTERVIEW_NOT_FOUND).await;
            }
            Err(e) => {
                warn!(user, %interview_id, error = %e, "interview lookup failed");
                return self.send(user, messages::INTERVIEW_NOT_FOUND).await;
            }
        };
        if interview.status != InterviewStatus::InProgress {
            return self.send(user, messages::INTERVIEW_NOT_OPEN).await;
        }

        let record = self
            .collaborators
            .store
            .create_session(user, SessionRole::Respondent, Some(interview_id))
            .await?;

        let instruction = interview.instruction_text().unwrap_or_default().to_string();
        let style = extract_style(&instruction).to_string();
        let memory_key = format!("respondent_{}_{}", user, interview_id);
        let mut session = InterviewSession::new(
            record.id,
            interview_id,
            memory_key,
            instruction.clone(),
            style.clone(),
        );

        self.send(user, &messages::respondent_welcome(&instruction))
            .await?;

        let opener = match timeout(
            self.config.generation_timeout,
            self.collaborators.judge.first_question(&instruction, &style),
        )
        .await
        {
            Ok(Ok(q)) if !q.trim().is_empty() => q,
            Ok(Err(e)) => {
                warn!(user, error = %e, "opening question generation failed");
                messages::FALLBACK_FIRST_QUESTION.to_string()
            }
            _ => messages::FALLBACK_FIRST_QUESTION.to_string(),
        };

        session.last_question = opener.clone();
        let record_id = session.record_id;
        let key = session.memory_key.clone();
        self.lock_sessions().insert(user, session);

        info!(user, %interview_id, "interview started");
        self.remember(&key, SpeakerRole::Assistant, &opener).await;
        self.send(user, &opener).await?;
        self.arm_inactivity(record_id, user);
        Ok(())
    }

    /// One respondent turn.
    pub async fn submit_answer(&self, user: UserId, text: &str) -> Result<(), FlowError> {
        let mut session = self
            .lock_sessions()
            .get(&user)
            .cloned()
            .ok_or(FlowError::NoSession(user))?;

        self.remember(&session.memory_key, SpeakerRole::User, text)
            .await;

        if self.lexicon.is_finish(text) {
            let attempts = session.register_finish_attempt(self.config.finish_confirm_window);
            if attempts >= 2 {
                return self.finish(user, session).await;
            }
            self.lock_sessions().insert(user, session.clone());
            self.remember(
                &session.memory_key,
                SpeakerRole::Assistant,
                messages::FINISH_CONFIRMATION,
            )
            .await;
            self.send(user, messages::FINISH_CONFIRMATION).await?;
            self.arm_inactivity(session.record_id, user);
            return Ok(());
        }
        if session.finish_attempts > 0 {
            session.reset_finish_attempts();
        }

        session
            .answers
            .push(QaPair::new(session.last_question.clone(), text));
        let answer_count = session.answers.len();

        let patch = SessionPatch {
            answers: Some(session.answers.clone()),
            ..Default::default()
        };
        if let Err(e) = self
            .collaborators
            .store
            .update_session(session.record_id, patch)
            .await
        {
            warn!(user, error = %e, "failed to persist answers mid-interview");
        }

        if self.config.milestones.contains(&answer_count) {
            self.spawn_interim_report(&session, user, answer_count);
        }

        let history = self
            .collaborators
            .memory
            .recent(&session.memory_key, self.config.history_window)
            .await;

        let next = self.next_question(&session, &history).await;
        let next = match next {
            NextQuestion::Finish if answer_count < self.config.min_answers => {
                NextQuestion::Ask(messages::CONTINUATION_QUESTION.to_string())
            }
            other => other,
        };

        match next {
            NextQuestion::Ask(question) => {
                session.last_question = question.clone();
                let record_id = session.record_id;
                let key = session.memory_key.clone();
                self.lock_sessions().insert(user, session);
                self.remember(&key, SpeakerRole::Assistant, &question).await;
                self.send(user, &question).await?;
                self.arm_inactivity(record_id, user);
                Ok(())
            }
            NextQuestion::Finish => self.finish(user, session).await,
        }
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
        let session = self.lock_sessions().remove(&user);
        if let Some(session) = session {
            self.clear(session.record_id);
            info!(user, "interview cancelled");
            self.send(user, messages::SESSION_CANCELLED).await?;
        }
        Ok(())
    }

    /// Wrap up: summarize, close the record, report to the researcher,
    /// thank the respondent.
    async fn finish(&self, user: UserId, session: InterviewSession) -> Result<(), FlowError> {
        let answer_count = session.answers.len();
        let summary = self.final_summary(&session).await;

        let patch = SessionPatch {
            status: Some(SessionStatus::Completed),
            answers: Some(session.answers.clone()),
            summary: Some(summary.clone()),
        };
        if let Err(e) = self
            .collaborators
            .store
            .update_session(session.record_id, patch)
            .await
        {
            warn!(user, error = %e, "failed to close interview session");
            self.lock_sessions().remove(&user);
            self.clear(session.record_id);
            return self.send(user, messages::INTERVIEW_SAVE_FAILED).await;
        }

        let mut reward = None;
        match self
            .collaborators
            .store
            .get_interview(session.interview_id)
            .await
        {
            Ok(Some(interview)) => {
                reward = interview.reward_link().map(str::to_string);
                match interview.researcher_chat_id() {
                    Some(researcher) => {
                        let report = messages::final_report(user, answer_count, &summary);
                        if let Err(e) = self
                            .collaborators
                            .transport
                            .send_text(researcher, &report)
                            .await
                        {
                            warn!(researcher, error = %e, "failed to deliver final report");
                        }
                    }
                    None => {
                        warn!(interview_id = %session.interview_id, "no researcher id, final report dropped")
                    }
                }
            }
            Ok(None) | Err(_) => {
                warn!(interview_id = %session.interview_id, "interview lookup failed, final report dropped")
            }
        }

        self.lock_sessions().remove(&user);
        self.clear(session.record_id);
        info!(user, interview_id = %session.interview_id, answer_count, "interview finished");
        self.send(user, &messages::thank_you(reward.as_deref()))
            .await
    }

    /// Summary text for the closing report. Short interviews get a
    /// template; a failed or slow summarizer degrades to a raw digest.
    async fn final_summary(&self, session: &InterviewSession) -> String {
        if session.answers.is_empty() {
            return messages::SUMMARY_NO_ANSWERS.to_string();
        }
        if session.answers.len() < 3 {
            return messages::summary_early_exit(session.answers.len());
        }
        match timeout(
            self.config.generation_timeout,
            self.collaborators.judge.summarize(&session.answers),
        )
        .await
        {
            Ok(Ok(summary)) if !summary.trim().is_empty() => summary,
            Ok(Err(e)) => {
                warn!(error = %e, "summary generation failed");
                messages::summary_digest(&session.answers)
            }
            _ => messages::summary_digest(&session.answers),
        }
    }

    async fn next_question(
        &self,
        session: &InterviewSession,
        history: &[intervue_store::MemoryMessage],
    ) -> NextQuestion {
        let input = NextQuestionInput {
            instruction: &session.instruction,
            answers: &session.answers,
            history,
            style: &session.style,
        };
        match timeout(
            self.config.judge_timeout,
            self.collaborators.judge.next_question(input),
        )
        .await
        {
            Ok(Ok(next)) => next,
            Ok(Err(e)) => {
                warn!(error = %e, "next question generation failed");
                NextQuestion::Ask(messages::CONTINUATION_QUESTION.to_string())
            }
            Err(_) => {
                warn!("next question generation timed out");
                NextQuestion::Ask(messages::CONTINUATION_QUESTION.to_string())
            }
        }
    }

    /// Interim reports never block the respondent's turn: summarize and
    /// deliver on a detached task, failures logged and dropped.
    fn spawn_interim_report(&self, session: &InterviewSession, user: UserId, count: usize) {
        let judge: Arc<dyn Judge> = self.collaborators.judge.clone();
        let store: Arc<dyn RecordStore> = self.collaborators.store.clone();
        let transport: Arc<dyn ChatTransport> = self.collaborators.transport.clone();
        let answers = session.answers.clone();
        let interview_id = session.interview_id;
        let generation_timeout = self.config.generation_timeout;

        let handle = tokio::spawn(async move {
            let summary = match timeout(generation_timeout, judge.summarize(&answers)).await {
                Ok(Ok(summary)) => summary,
                Ok(Err(e)) => {
                    warn!(%interview_id, error = %e, "interim summary failed");
                    return;
                }
                Err(_) => {
                    warn!(%interview_id, "interim summary timed out");
                    return;
                }
            };
            let researcher = match store.get_interview(interview_id).await {
                Ok(Some(interview)) => interview.researcher_chat_id(),
                _ => None,
            };
            let Some(researcher) = researcher else {
                warn!(%interview_id, "no researcher id, interim report dropped");
                return;
            };
            let report = messages::interim_report(count, user, &summary);
            if let Err(e) = transport.send_text(researcher, &report).await {
                warn!(researcher, error = %e, "failed to deliver interim report");
            }
        });

        self.lock_interim()
            .entry(session.record_id)
            .or_default()
            .push(handle);
    }

    /// Re-arm the inactivity timers for a session. The first reminder
    /// fires after the primary delay, then the escalation timer takes
    /// over for the final nudge.
    fn arm_inactivity(&self, record_id: Uuid, user: UserId) {
        let timers = self.timers.clone();
        let transport = self.collaborators.transport.clone();
        let escalation_delay = self.config.escalation_reminder_delay;

        self.timers.arm(
            record_id,
            ReminderStage::First,
            self.config.primary_reminder_delay,
            async move {
                if let Err(e) = transport.send_text(user, messages::FIRST_REMINDER).await {
                    warn!(user, error = %e, "failed to deliver first reminder");
                }
                let escalation_transport = transport.clone();
                timers.arm(record_id, ReminderStage::Second, escalation_delay, async move {
                    if let Err(e) = escalation_transport
                        .send_text(user, messages::SECOND_REMINDER)
                        .await
                    {
                        warn!(user, error = %e, "failed to deliver second reminder");
                    }
                });
            },
        );
    }

    fn clear(&self, record_id: Uuid) {
        self.timers.cancel_all(record_id);
        if let Some(handles) = self.lock_interim().remove(&record_id) {
            for handle in handles {
                if !handle.is_finished() {
                    handle.abort();
                }
            }
        }
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, InterviewSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_interim(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Vec<JoinHandle<()>>>> {
        self.interim_tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn send(&self, user: UserId, text: &str) -> Result<(), FlowError> {
        self.collaborators.transport.send_text(user, text).await?;
        Ok(())
    }

    async fn remember(&self, key: &str, role: SpeakerRole, text: &str) {
        self.collaborators.memory.append(key, role, text).await;
    }
}
