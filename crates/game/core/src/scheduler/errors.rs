use crate::error::{CombatError, ErrorSeverity};

/// Errors that can occur during turn operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerError {
    #[error("no alive participants remain in the encounter")]
    NoAliveParticipants,

    /// `advance` re-entered itself; the scheduler's bookkeeping is suspect.
    #[error("turn advancement already in progress")]
    AlreadyAdvancing,

    #[error("encounter has not started")]
    NotStarted,
}

impl CombatError for SchedulerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoAliveParticipants => ErrorSeverity::Fatal,
            Self::AlreadyAdvancing => ErrorSeverity::Internal,
            Self::NotStarted => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoAliveParticipants => "SCHEDULER_NO_ALIVE_PARTICIPANTS",
            Self::AlreadyAdvancing => "SCHEDULER_ALREADY_ADVANCING",
            Self::NotStarted => "SCHEDULER_NOT_STARTED",
        }
    }
}
