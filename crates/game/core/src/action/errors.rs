use crate::error::{CombatError, ErrorSeverity};

/// Enqueue rejection. The queue is left exactly as it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnqueueError {
    #[error("action queue is full ({capacity} entries)")]
    QueueFull { capacity: usize },
}

impl CombatError for EnqueueError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::QueueFull { .. } => "RUNNER_QUEUE_FULL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UndoError {
    #[error("action does not support undo")]
    Unsupported,

    #[error("no completed action to undo")]
    NothingToUndo,

    #[error("undo failed: {0}")]
    Failed(String),
}

impl CombatError for UndoError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unsupported | Self::NothingToUndo => ErrorSeverity::Validation,
            Self::Failed(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unsupported => "RUNNER_UNDO_UNSUPPORTED",
            Self::NothingToUndo => "RUNNER_NOTHING_TO_UNDO",
            Self::Failed(_) => "RUNNER_UNDO_FAILED",
        }
    }
}
