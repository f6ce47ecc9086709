use std::time::Duration;

/// Tunables for both conversation flows. Defaults match the production
/// deployment; tests override the delays they care about.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Inactivity before the first nudge.
    pub primary_reminder_delay: Duration,
    /// Inactivity after the first nudge before the final one.
    pub escalation_reminder_delay: Duration,
    /// How long a finish request stays armed waiting for confirmation.
    pub finish_confirm_window: Duration,
    /// Interviews never end on the generator's say-so before this many answers.
    pub min_answers: usize,
    /// Answer counts at which an interim report goes to the researcher.
    pub milestones: Vec<usize>,
    /// How many transcript messages the question generator sees.
    pub history_window: usize,
    /// Budget for per-answer judge calls.
    pub judge_timeout: Duration,
    /// Budget for long generations (brief, summary).
    pub generation_timeout: Duration,
    /// Heading that introduces the respondent-facing instruction inside
    /// a generated brief.
    pub instruction_marker: String,
    /// Prefix for respondent share links; the token is appended as-is.
    pub share_link_base: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_reminder_delay: Duration::from_secs(120),
            escalation_reminder_delay: Duration::from_secs(3600),
            finish_confirm_window: Duration::from_secs(300),
            min_answers: 8,
            milestones: vec![5, 10, 15],
            history_window: 10,
            judge_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(60),
            instruction_marker: "### 3. First message to the respondent".to_string(),
            share_link_base: "https://intervue.example/join/".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_primary_reminder_delay(mut self, delay: Duration) -> Self {
        self.primary_reminder_delay = delay;
        self
    }

    pub fn with_escalation_reminder_delay(mut self, delay: Duration) -> Self {
        self.escalation_reminder_delay = delay;
        self
    }

    pub fn with_min_answers(mut self, min: usize) -> Self {
        self.min_answers = min;
        self
    }

    pub fn with_milestones(mut self, milestones: Vec<usize>) -> Self {
        self.milestones = milestones;
        self
    }

    pub fn with_share_link_base(mut self, base: impl Into<String>) -> Self {
        self.share_link_base = base.into();
        self
    }
}
