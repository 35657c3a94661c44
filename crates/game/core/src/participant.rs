//! Participant abstraction supplied by the host game.
//!
//! The core never mutates a participant: it reads identity, speed, liveness
//! and controller kind, and invokes the two turn hooks. Hosts keep ownership
//! and hand the core shared handles ([`ParticipantRef`]) that stay valid for
//! the whole encounter.

use std::fmt;
use std::sync::Arc;

/// Stable identifier of a combat participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who decides a participant's actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Controller {
    Player,
    Ai,
}

impl Controller {
    pub fn as_str(&self) -> &'static str {
        match self {
            Controller::Player => "player",
            Controller::Ai => "ai",
        }
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A combatant as seen by the core.
///
/// Hooks take `&self`; hosts that need to mutate on turn start/end use
/// interior mutability.
pub trait Participant: Send + Sync {
    fn id(&self) -> ParticipantId;

    fn name(&self) -> &str;

    /// Raw speed statistic. Higher acts earlier.
    fn speed(&self) -> i32;

    fn is_alive(&self) -> bool;

    fn controller(&self) -> Controller;

    fn is_player_controlled(&self) -> bool {
        self.controller() == Controller::Player
    }

    /// Called when this participant becomes the current actor.
    fn on_turn_start(&self) {}

    /// Called when this participant's turn ends.
    fn on_turn_end(&self) {}
}

/// Shared, non-owning handle the core keeps for each participant.
pub type ParticipantRef = Arc<dyn Participant>;
