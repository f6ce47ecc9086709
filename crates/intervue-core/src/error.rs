use thiserror::Error;

use intervue_store::{StoreError, UserId};

use crate::traits::TransportError;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Judge(#[from] intervue_judge::JudgeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no active session for user {0}")]
    NoSession(UserId),
}
