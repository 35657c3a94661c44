//! Unified error types surfaced by the runtime API.
//!
//! Wraps worker coordination failures and encounter refusals so clients can
//! bubble them up with consistent context.
use std::fmt;

use combat_core::{Controller, EncounterError, TransitionError, UndoError};
use thiserror::Error;
use tokio::sync::oneshot;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{kind} decision provider not set")]
    ProviderNotSet { kind: ProviderKind },

    #[error("runtime requires a roster before building")]
    MissingRoster,

    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("event stream closed before the encounter finished")]
    EventStreamClosed,

    #[error("encounter did not finish within {max_rounds} rounds")]
    RoundLimit { max_rounds: u32 },

    #[error("{kind} decision provider failed: {message}")]
    Provider { kind: ProviderKind, message: String },

    #[error(transparent)]
    Encounter(#[from] EncounterError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Undo(#[from] UndoError),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Player,
    Ai,
}

impl From<Controller> for ProviderKind {
    fn from(controller: Controller) -> Self {
        match controller {
            Controller::Player => ProviderKind::Player,
            Controller::Ai => ProviderKind::Ai,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderKind::Player => "player",
            ProviderKind::Ai => "ai",
        };
        f.write_str(label)
    }
}
