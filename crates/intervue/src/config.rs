//! Project configuration file support.
//!
//! Loads configuration from `intervue.toml` in the working directory.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use intervue_core::EngineConfig;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "intervue.toml";

/// Project-level configuration loaded from `intervue.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub engine: EngineSection,
}

/// Which judge backend to talk to and how.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct JudgeConfig {
    /// "direct" calls an OpenAI-compatible API; "remote" posts typed
    /// operations to an orchestrator webhook.
    #[serde(default)]
    pub mode: JudgeMode,
    /// Base URL for direct mode and for transcription.
    pub base_url: Option<String>,
    /// API key; falls back to the INTERVUE_API_KEY environment variable.
    pub api_key: Option<String>,
    /// Chat model for direct mode.
    pub model: Option<String>,
    /// Webhook endpoint for remote mode.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JudgeMode {
    #[default]
    Direct,
    Remote,
}

/// Engine tunables. Everything is optional; unset values keep the
/// built-in defaults.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    #[serde(default, with = "humantime_serde::option")]
    pub primary_reminder_delay: Option<Duration>,
    #[serde(default, with = "humantime_serde::option")]
    pub escalation_reminder_delay: Option<Duration>,
    #[serde(default, with = "humantime_serde::option")]
    pub finish_confirm_window: Option<Duration>,
    pub min_answers: Option<usize>,
    pub milestones: Option<Vec<usize>>,
    pub share_link_base: Option<String>,
}

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Engine configuration with file overrides applied over the defaults.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(delay) = self.engine.primary_reminder_delay {
            config.primary_reminder_delay = delay;
        }
        if let Some(delay) = self.engine.escalation_reminder_delay {
            config.escalation_reminder_delay = delay;
        }
        if let Some(window) = self.engine.finish_confirm_window {
            config.finish_confirm_window = window;
        }
        if let Some(min) = self.engine.min_answers {
            config.min_answers = min;
        }
        if let Some(ref milestones) = self.engine.milestones {
            config.milestones = milestones.clone();
        }
        if let Some(ref base) = self.engine.share_link_base {
            config.share_link_base = base.clone();
        }
        config
    }

    /// API key from the file or the environment.
    pub fn api_key(&self) -> Option<String> {
        self.judge
            .api_key
            .clone()
            .or_else(|| std::env::var("INTERVUE_API_KEY").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn durations_parse_humantime_strings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
[engine]
primary_reminder_delay = "2m"
escalation_reminder_delay = "1h"
min_answers = 6
milestones = [3, 6]
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        let engine = config.engine_config();
        assert_eq!(engine.primary_reminder_delay, Duration::from_secs(120));
        assert_eq!(engine.escalation_reminder_delay, Duration::from_secs(3600));
        assert_eq!(engine.min_answers, 6);
        assert_eq!(engine.milestones, vec![3, 6]);
        // Untouched values keep their defaults.
        assert_eq!(engine.finish_confirm_window, Duration::from_secs(300));
    }

    #[test]
    fn unknown_keys_are_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[engine]\nmin_answerz = 5\n",
        )
        .unwrap();
        assert!(ProjectConfig::load(dir.path()).is_err());
    }

    #[test]
    fn judge_mode_defaults_to_direct() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[judge]\nmodel = \"gpt-4o\"\n")
            .unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.judge.mode, JudgeMode::Direct);
        assert_eq!(config.judge.model.as_deref(), Some("gpt-4o"));
    }
}
