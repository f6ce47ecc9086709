use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    User,
    Assistant,
}

/// One line of conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMessage {
    pub role: SpeakerRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl MemoryMessage {
    pub fn new(role: SpeakerRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only conversation log with a bounded recent-history reader.
///
/// Best-effort by contract: a failed append or read is logged and
/// degrades to nothing, it never fails the turn that triggered it.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    async fn append(&self, session_key: &str, role: SpeakerRole, text: &str);

    /// Most recent `limit` messages, oldest first.
    async fn recent(&self, session_key: &str, limit: usize) -> Vec<MemoryMessage>;
}

/// Transcript log held in process memory. Used by tests and local runs.
#[derive(Default)]
pub struct InMemoryMemory {
    logs: Mutex<HashMap<String, Vec<MemoryMessage>>>,
}

impl InMemoryMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationMemory for InMemoryMemory {
    async fn append(&self, session_key: &str, role: SpeakerRole, text: &str) {
        self.logs
            .lock()
            .expect("memory log poisoned")
            .entry(session_key.to_string())
            .or_default()
            .push(MemoryMessage::new(role, text));
    }

    async fn recent(&self, session_key: &str, limit: usize) -> Vec<MemoryMessage> {
        let logs = self.logs.lock().expect("memory log poisoned");
        let Some(messages) = logs.get(session_key) else {
            return Vec::new();
        };
        let skip = messages.len().saturating_sub(limit);
        messages[skip..].to_vec()
    }
}

/// Transcript log persisted as one JSONL file per session key.
pub struct JsonlMemory {
    transcripts_dir: PathBuf,
}

impl JsonlMemory {
    /// Create a memory log under the platform data directory.
    pub fn new() -> std::io::Result<Self> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine data directory",
            )
        })?;
        Ok(Self {
            transcripts_dir: data_dir.join("intervue").join("transcripts"),
        })
    }

    /// Create a memory log with a custom directory (useful for testing).
    pub fn with_dir(transcripts_dir: PathBuf) -> Self {
        Self { transcripts_dir }
    }

    fn transcript_path(&self, session_key: &str) -> PathBuf {
        // Session keys are generated internally (role_user_interview) and
        // are already safe as file names.
        self.transcripts_dir.join(format!("{session_key}.jsonl"))
    }
}

#[async_trait]
impl ConversationMemory for JsonlMemory {
    async fn append(&self, session_key: &str, role: SpeakerRole, text: &str) {
        let message = MemoryMessage::new(role, text);
        let path = self.transcript_path(session_key);

        let result = (|| -> std::io::Result<()> {
            fs::create_dir_all(&self.transcripts_dir)?;
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            let line = serde_json::to_string(&message)?;
            writeln!(file, "{line}")?;
            Ok(())
        })();

        if let Err(e) = result {
            tracing::warn!(error = %e, ?path, "failed to append transcript line");
        }
    }

    async fn recent(&self, session_key: &str, limit: usize) -> Vec<MemoryMessage> {
        let path = self.transcript_path(session_key);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let mut messages = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!(error = %e, ?path, "failed to read transcript line");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MemoryMessage>(&line) {
                Ok(message) => messages.push(message),
                Err(e) => tracing::warn!(error = %e, ?path, "skipping malformed transcript line"),
            }
        }

        let skip = messages.len().saturating_sub(limit);
        messages.split_off(skip)
    }
}
