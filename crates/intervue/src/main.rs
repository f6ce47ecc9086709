mod config;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use intervue_core::{Collaborators, FlowError, IntakeFlow, InterviewFlow};
use intervue_judge::{AudioTranscriber, DirectJudge, Judge, RemoteJudge, Transcriber};
use intervue_store::{ConversationMemory, InMemoryStore, JsonlMemory, UserId};

use config::{JudgeMode, ProjectConfig};
use console::{print_error, print_hint, ConsoleTransport};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Parser, Debug)]
#[command(
    name = "intervue",
    about = "Conversational research interview engine",
    version,
    author
)]
struct Cli {
    /// Working directory holding intervue.toml (default: current directory)
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Chat-user id to impersonate in the local console
    #[arg(short, long, default_value_t = 1)]
    user_id: UserId,

    /// Directory for conversation transcripts (default: platform data dir)
    #[arg(long)]
    transcripts_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
}

fn init_tracing(format: LogFormatChoice) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("intervue=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match format {
        LogFormatChoice::Pretty => builder.init(),
        LogFormatChoice::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let working_dir = cli
        .working_dir
        .clone()
        .map(Ok)
        .unwrap_or_else(std::env::current_dir)
        .context("Failed to resolve working directory")?;

    let project = ProjectConfig::load(&working_dir)?.unwrap_or_default();
    let engine_config = project.engine_config();
    tracing::info!(dir = %working_dir.display(), "configuration loaded");

    let (judge, transcriber) = build_judge(&project)?;
    let memory: Arc<dyn ConversationMemory> = match cli.transcripts_dir {
        Some(dir) => Arc::new(JsonlMemory::with_dir(dir)),
        None => Arc::new(JsonlMemory::new().context("Failed to locate a transcripts directory")?),
    };

    let collaborators = Collaborators {
        store: Arc::new(InMemoryStore::new()),
        judge,
        memory,
        transport: Arc::new(ConsoleTransport::new(cli.user_id)),
        transcriber,
    };

    let intake = IntakeFlow::new(collaborators.clone(), engine_config.clone());
    let interviews = InterviewFlow::new(collaborators, engine_config);

    print_hint("Commands: /research, /join <interview-id>, /voice <audio-file>, /cancel, /quit");
    run_console(cli.user_id, &intake, &interviews).await
}

fn build_judge(project: &ProjectConfig) -> Result<(Arc<dyn Judge>, Arc<dyn Transcriber>)> {
    let base_url = project
        .judge
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let api_key = project
        .api_key()
        .context("No API key: set judge.api_key in intervue.toml or INTERVUE_API_KEY")?;
    let model = project
        .judge
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let transcriber: Arc<dyn Transcriber> = Arc::new(AudioTranscriber::new(
        base_url.clone(),
        api_key.clone(),
        "whisper-1",
    ));

    let judge: Arc<dyn Judge> = match project.judge.mode {
        JudgeMode::Direct => Arc::new(DirectJudge::new(base_url, api_key, model)),
        JudgeMode::Remote => {
            let webhook = project
                .judge
                .webhook_url
                .clone()
                .context("judge.mode = \"remote\" requires judge.webhook_url")?;
            Arc::new(RemoteJudge::new(webhook, api_key))
        }
    };
    Ok((judge, transcriber))
}

/// Line-oriented chat loop. One local user; the flows route everything
/// else (researcher reports included) through the shared transport.
async fn run_console(
    user: UserId,
    intake: &IntakeFlow,
    interviews: &InterviewFlow,
) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let result = match line.split_once(' ') {
            _ if line == "/quit" => break,
            _ if line == "/research" => intake.start(user).await,
            _ if line == "/cancel" => {
                if intake.has_session(user) {
                    intake.cancel(user).await
                } else {
                    interviews.cancel(user).await
                }
            }
            Some(("/join", id)) => match id.trim().parse::<Uuid>() {
                Ok(id) => interviews.start(user, id).await,
                Err(_) => {
                    print_error("that doesn't look like an interview id");
                    continue;
                }
            },
            Some(("/voice", path)) => match tokio::fs::read(path.trim()).await {
                Ok(audio) => route_voice(user, &audio, intake, interviews).await,
                Err(e) => {
                    print_error(&format!("couldn't read {}: {e}", path.trim()));
                    continue;
                }
            },
            _ => route_text(user, &line, intake, interviews).await,
        };

        match result {
            Ok(()) => {}
            Err(FlowError::NoSession(_)) => {
                print_hint("No conversation yet. /research starts one, /join <id> answers one.");
            }
            Err(e) => print_error(&e.to_string()),
        }
    }
    Ok(())
}

async fn route_text(
    user: UserId,
    text: &str,
    intake: &IntakeFlow,
    interviews: &InterviewFlow,
) -> Result<(), FlowError> {
    if intake.has_session(user) {
        intake.submit_answer(user, text).await
    } else {
        interviews.submit_answer(user, text).await
    }
}

async fn route_voice(
    user: UserId,
    audio: &[u8],
    intake: &IntakeFlow,
    interviews: &InterviewFlow,
) -> Result<(), FlowError> {
    if intake.has_session(user) {
        intake.submit_voice(user, audio).await
    } else {
        interviews.submit_voice(user, audio).await
    }
}
