mod direct;
mod prompts;
mod quality;
mod remote;
mod traits;

pub use direct::{AudioTranscriber, DirectJudge};
pub use prompts::JudgePrompts;
pub use quality::{NextQuestion, QualityParseError, QualityVerdict, FINISH_SENTINEL};
pub use remote::RemoteJudge;
pub use traits::{EvaluationInput, Judge, JudgeError, NextQuestionInput, Transcriber};
