use crate::error::{CombatError, ErrorSeverity};

use super::Phase;

/// Reasons a phase transition request was refused. The machine's state is
/// untouched in every case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionError {
    #[error("transition {from} -> {to} is not allowed")]
    NotAllowed { from: Phase, to: Phase },

    #[error("transitions are locked while in {current}")]
    Locked { current: Phase },

    #[error("already in {phase}")]
    AlreadyInPhase { phase: Phase },
}

impl CombatError for TransitionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotAllowed { .. } | Self::AlreadyInPhase { .. } => ErrorSeverity::Validation,
            Self::Locked { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAllowed { .. } => "PHASE_TRANSITION_NOT_ALLOWED",
            Self::Locked { .. } => "PHASE_TRANSITION_LOCKED",
            Self::AlreadyInPhase { .. } => "PHASE_ALREADY_ACTIVE",
        }
    }
}
