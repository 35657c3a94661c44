//! Asynchronous abstraction for sourcing turn decisions.
//!
//! Runtime users plug in [`DecisionProvider`] implementations so encounters
//! can run with human input, scripted fixtures, or AI policies.
use async_trait::async_trait;
use combat_core::{CombatAction, EncounterSnapshot, TurnSnapshot};

use super::errors::Result;

/// What a participant does with its turn.
pub enum Decision {
    /// Submit these actions in order, then end the turn once they have run.
    Act(Vec<Box<dyn CombatAction>>),
    /// End the turn without acting.
    Pass,
}

impl Decision {
    pub fn single(action: impl CombatAction + 'static) -> Self {
        Decision::Act(vec![Box::new(action)])
    }
}

/// Trait for deciding what the current actor does.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - AI decisions
/// - Scripted/replayed turns
/// - Testing fixtures
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Decide the turn described by `turn`.
    ///
    /// `encounter` is a snapshot taken right after the turn started.
    async fn decide(&self, turn: &TurnSnapshot, encounter: &EncounterSnapshot) -> Result<Decision>;
}

/// Always passes. Useful for testing or as a fallback.
pub struct PassProvider;

#[async_trait]
impl DecisionProvider for PassProvider {
    async fn decide(&self, _turn: &TurnSnapshot, _encounter: &EncounterSnapshot) -> Result<Decision> {
        Ok(Decision::Pass)
    }
}
