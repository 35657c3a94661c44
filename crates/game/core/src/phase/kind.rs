/// Coarse combat-flow state.
///
/// The transition table lives in [`Phase::allowed_targets`]; everything that
/// validates transitions goes through it.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    WaitingForDecision,
    ActorTurnPlayer,
    ActorTurnEnemy,
    ExecutingAction,
    TurnTransition,
    Victory,
    Defeat,
}

impl Phase {
    /// Phases reachable from `self` in one transition.
    pub const fn allowed_targets(self) -> &'static [Phase] {
        use Phase::*;
        match self {
            Idle => &[ActorTurnPlayer, ActorTurnEnemy],
            ActorTurnPlayer => &[
                WaitingForDecision,
                ExecutingAction,
                TurnTransition,
                Victory,
                Defeat,
            ],
            WaitingForDecision => &[ExecutingAction, TurnTransition, ActorTurnPlayer],
            ActorTurnEnemy => &[ExecutingAction, TurnTransition, Victory, Defeat],
            ExecutingAction => &[
                ActorTurnPlayer,
                ActorTurnEnemy,
                WaitingForDecision,
                TurnTransition,
                Victory,
                Defeat,
            ],
            TurnTransition => &[ActorTurnPlayer, ActorTurnEnemy, Victory, Defeat],
            Victory | Defeat => &[Idle],
        }
    }

    pub fn can_transition_to(self, target: Phase) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Victory and Defeat: the encounter is over, only a reset leaves them.
    pub const fn is_outcome(self) -> bool {
        matches!(self, Phase::Victory | Phase::Defeat)
    }

    /// Phases during which a participant owns the turn.
    pub const fn is_actor_turn(self) -> bool {
        matches!(
            self,
            Phase::ActorTurnPlayer
                | Phase::ActorTurnEnemy
                | Phase::WaitingForDecision
                | Phase::ExecutingAction
        )
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
