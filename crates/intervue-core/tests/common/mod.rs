//! Shared doubles for the flow tests: a recording transport and a judge
//! whose responses are scripted per test.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use intervue_core::{ChatTransport, Collaborators, TransportError};
use intervue_judge::{
    EvaluationInput, Judge, JudgeError, NextQuestion, NextQuestionInput, QualityVerdict,
    Transcriber,
};
use intervue_store::{InMemoryMemory, InMemoryStore, QaPair, RecordStore, UserId};

/// Records every outbound message.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<(UserId, String)>>,
    pub fail: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(UserId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, user: UserId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn last_to(&self, user: UserId) -> Option<String> {
        self.sent_to(user).pop()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_text(&self, recipient: UserId, text: &str) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Delivery("scripted failure".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient, text.to_string()));
        Ok(())
    }
}

/// Judge double. Verdicts and next questions are consumed front-to-back;
/// when a queue runs dry the default (accept / generic question) applies.
pub struct ScriptedJudge {
    pub verdicts: Mutex<VecDeque<QualityVerdict>>,
    pub next_questions: Mutex<VecDeque<NextQuestion>>,
    pub brief: String,
    pub fail_brief: AtomicBool,
    pub fail_instruction: AtomicBool,
    pub fail_summary: AtomicBool,
    pub summary: String,
    pub first_question: String,
}

impl Default for ScriptedJudge {
    fn default() -> Self {
        Self {
            verdicts: Mutex::new(VecDeque::new()),
            next_questions: Mutex::new(VecDeque::new()),
            brief: concat!(
                "### 1. Goals\nUnderstand the segment.\n",
                "### 3. First message to the respondent\n",
                "Hi! We're researching how small businesses handle inventory.\n",
                "### 4. Question plan\nOpen with context."
            )
            .to_string(),
            fail_brief: AtomicBool::new(false),
            fail_instruction: AtomicBool::new(false),
            fail_summary: AtomicBool::new(false),
            summary: "Key insight: spreadsheets everywhere.".to_string(),
            first_question: "To start, what does your business do?".to_string(),
        }
    }
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_verdict(&self, verdict: QualityVerdict) {
        self.verdicts.lock().unwrap().push_back(verdict);
    }

    pub fn push_question(&self, question: NextQuestion) {
        self.next_questions.lock().unwrap().push_back(question);
    }
}

pub fn accepted(value: &str) -> QualityVerdict {
    QualityVerdict {
        is_complete: true,
        confidence: 0.9,
        missing_aspects: Vec::new(),
        extracted_value: Some(value.to_string()),
    }
}

pub fn needs_more(aspects: &[&str], confidence: f64) -> QualityVerdict {
    QualityVerdict {
        is_complete: false,
        confidence,
        missing_aspects: aspects.iter().map(|s| s.to_string()).collect(),
        extracted_value: None,
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn evaluate_answer(
        &self,
        input: EvaluationInput<'_>,
    ) -> Result<QualityVerdict, JudgeError> {
        Ok(self
            .verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| accepted(input.answer)))
    }

    async fn generate_clarification(
        &self,
        field: &str,
        _question: &str,
        _answer: &str,
        _missing_aspects: &[String],
    ) -> Result<String, JudgeError> {
        Ok(format!("Could you say more about {field}?"))
    }

    async fn generate_brief(&self, _fields: &Map<String, Value>) -> Result<String, JudgeError> {
        if self.fail_brief.load(Ordering::SeqCst) {
            return Err(JudgeError::Transport("scripted brief failure".into()));
        }
        Ok(self.brief.clone())
    }

    async fn generate_instruction(
        &self,
        _fields: &Map<String, Value>,
    ) -> Result<String, JudgeError> {
        if self.fail_instruction.load(Ordering::SeqCst) {
            return Err(JudgeError::Transport("scripted instruction failure".into()));
        }
        Ok("Hi! Thanks for joining this interview.".to_string())
    }

    async fn first_question(
        &self,
        _instruction: &str,
        _style: &str,
    ) -> Result<String, JudgeError> {
        Ok(self.first_question.clone())
    }

    async fn next_question(
        &self,
        _input: NextQuestionInput<'_>,
    ) -> Result<NextQuestion, JudgeError> {
        Ok(self
            .next_questions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| NextQuestion::Ask("And what happened next?".to_string())))
    }

    async fn summarize(&self, _answers: &[QaPair]) -> Result<String, JudgeError> {
        if self.fail_summary.load(Ordering::SeqCst) {
            return Err(JudgeError::Transport("scripted summary failure".into()));
        }
        Ok(self.summary.clone())
    }
}

pub struct FixedTranscriber {
    pub text: String,
    pub fail: AtomicBool,
}

impl FixedTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, JudgeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(JudgeError::Transport("scripted transcription failure".into()));
        }
        Ok(self.text.clone())
    }
}

pub struct Harness {
    pub collaborators: Collaborators,
    pub store: Arc<InMemoryStore>,
    pub transport: Arc<MockTransport>,
    pub judge: Arc<ScriptedJudge>,
    pub transcriber: Arc<FixedTranscriber>,
}

impl Harness {
    pub async fn interview(&self, id: uuid::Uuid) -> intervue_store::Interview {
        self.store.get_interview(id).await.unwrap().unwrap()
    }
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(MockTransport::new());
    let judge = Arc::new(ScriptedJudge::new());
    let transcriber = Arc::new(FixedTranscriber::new("transcribed answer"));
    let collaborators = Collaborators {
        store: store.clone(),
        judge: judge.clone(),
        memory: Arc::new(InMemoryMemory::new()),
        transport: transport.clone(),
        transcriber: transcriber.clone(),
    };
    Harness {
        collaborators,
        store,
        transport,
        judge,
        transcriber,
    }
}

/// Lets already-spawned tasks run to their next await point. Used to
/// drain fire-and-forget work under the paused clock.
pub async fn drain_tasks() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
