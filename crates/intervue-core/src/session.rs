use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::Instant;
use uuid::Uuid;

/// Per-researcher intake progress. Cloned out of the session map for each
/// turn and written back at the end, so turns never hold the lock across
/// awaits.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    pub interview_id: Uuid,
    pub memory_key: String,
    pub collected: Map<String, Value>,
    /// Index into the field plan of the question currently on the table.
    pub field_index: usize,
    /// Set after a clarification was sent; the next verdict on this field
    /// is terminal (accept or reject), never a second clarification.
    pub awaiting_clarification: bool,
    pub last_question: String,
}

impl IntakeSession {
    pub fn new(interview_id: Uuid, memory_key: String) -> Self {
        Self {
            interview_id,
            memory_key,
            collected: Map::new(),
            field_index: 0,
            awaiting_clarification: false,
            last_question: String::new(),
        }
    }
}

/// Per-respondent interview progress.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    pub record_id: Uuid,
    pub interview_id: Uuid,
    pub memory_key: String,
    pub instruction: String,
    pub style: String,
    pub answers: Vec<intervue_store::QaPair>,
    pub last_question: String,
    pub finish_attempts: u32,
    pub last_finish_attempt: Option<Instant>,
}

impl InterviewSession {
    pub fn new(
        record_id: Uuid,
        interview_id: Uuid,
        memory_key: String,
        instruction: String,
        style: String,
    ) -> Self {
        Self {
            record_id,
            interview_id,
            memory_key,
            instruction,
            style,
            answers: Vec::new(),
            last_question: String::new(),
            finish_attempts: 0,
            last_finish_attempt: None,
        }
    }

    /// Count a finish request, resetting the streak when the previous one
    /// is older than the confirmation window. Returns the new count.
    pub fn register_finish_attempt(&mut self, window: Duration) -> u32 {
        let now = Instant::now();
        if let Some(previous) = self.last_finish_attempt {
            if now.duration_since(previous) > window {
                self.finish_attempts = 0;
            }
        }
        self.finish_attempts += 1;
        self.last_finish_attempt = Some(now);
        self.finish_attempts
    }

    pub fn reset_finish_attempts(&mut self) {
        self.finish_attempts = 0;
        self.last_finish_attempt = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> InterviewSession {
        InterviewSession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "respondent_1".into(),
            "instruction".into(),
            "friendly".into(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn second_attempt_within_window_counts_to_two() {
        let mut s = session();
        let window = Duration::from_secs(300);
        assert_eq!(s.register_finish_attempt(window), 1);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(s.register_finish_attempt(window), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_attempt_resets_the_streak() {
        let mut s = session();
        let window = Duration::from_secs(300);
        assert_eq!(s.register_finish_attempt(window), 1);
        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(s.register_finish_attempt(window), 1);
    }

    #[test]
    fn reset_clears_both_fields() {
        let mut s = session();
        s.finish_attempts = 1;
        s.reset_finish_attempts();
        assert_eq!(s.finish_attempts, 0);
        assert!(s.last_finish_attempt.is_none());
    }
}
