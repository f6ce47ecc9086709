//! Conversation-state machines: quality-gated researcher intake and
//! adaptive respondent interviews, glued to storage, judge, memory, and
//! transport through injected trait objects.

mod config;
mod error;
mod fields;
mod intents;
mod researcher;
mod respondent;
mod session;
mod timers;
mod traits;
mod validator;

pub mod messages;

pub use config::EngineConfig;
pub use error::FlowError;
pub use fields::{FieldPlan, FieldSpec, FINALIZE_MIN_LEN};
pub use intents::{extract_style, IntentLexicon};
pub use researcher::{extract_instruction, IntakeFlow};
pub use respondent::InterviewFlow;
pub use session::{IntakeSession, InterviewSession};
pub use timers::{ReminderStage, TimerCoordinator};
pub use traits::{ChatTransport, Collaborators, TransportError};
pub use validator::{validate, ValidationResult};
