mod memory;
mod store;
mod types;

pub use memory::{ConversationMemory, InMemoryMemory, JsonlMemory, MemoryMessage, SpeakerRole};
pub use store::{InMemoryStore, RecordStore, StoreError};
pub use types::{
    Interview, InterviewPatch, InterviewStatus, QaPair, SessionPatch, SessionRecord, SessionRole,
    SessionStatus, UserId, INSTRUCTION_FIELD, RESEARCHER_ID_FIELD, REWARD_LINK_FIELD,
};
