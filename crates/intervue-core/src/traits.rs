use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use intervue_judge::{Judge, Transcriber};
use intervue_store::{ConversationMemory, RecordStore, UserId};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("message delivery failed: {0}")]
    Delivery(String),
}

/// Outbound side of the chat transport. Inbound turns arrive through the
/// flow methods; the transport layer serializes delivery so that at most
/// one turn per session is in flight (precondition, not defended here).
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, recipient: UserId, text: &str) -> Result<(), TransportError>;
}

/// The external collaborators both flows depend on, injected at
/// construction time.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn RecordStore>,
    pub judge: Arc<dyn Judge>,
    pub memory: Arc<dyn ConversationMemory>,
    pub transport: Arc<dyn ChatTransport>,
    pub transcriber: Arc<dyn Transcriber>,
}
