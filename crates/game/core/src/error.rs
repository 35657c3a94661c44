//! Common error infrastructure for combat-core.
//!
//! Component-specific errors (e.g. [`SchedulerError`](crate::scheduler::SchedulerError),
//! [`TransitionError`](crate::phase::TransitionError)) are defined next to the
//! component that produces them. This module provides the classification they
//! share so hosts can pick a recovery strategy without matching every variant.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the operation was refused but the encounter is intact;
///   retrying later (e.g. after the queue drains) may succeed
/// - **Validation**: the request itself is invalid and must change before retry
/// - **Internal**: unexpected state inconsistency, indicates a bug
/// - **Fatal**: the encounter cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Refused for now, state untouched.
    ///
    /// Examples: action queue full, transitions locked
    Recoverable,

    /// Invalid request, rejected without side effects.
    ///
    /// Examples: transition not in the table, same-phase transition
    Validation,

    /// Unexpected state inconsistency.
    ///
    /// Examples: scheduler advance re-entered while already advancing
    Internal,

    /// The encounter cannot continue.
    ///
    /// Examples: no alive participants remain
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if the encounter must end.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
/// - Keep `error_code` stable; hosts use it for metrics and tests
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
