//! Seeded provider that strikes the first standing opponent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use combat_content::{KnockoutAction, RosterParticipant, TimedAction};
use combat_core::{ActionCategory, EncounterSnapshot, Participant, TurnSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::{Decision, DecisionProvider, Result};

/// Picks the first alive participant on the other side, in roster order, and
/// swings at it. A hit knocks the target out; a miss just spends the wind-up.
/// Passes when nobody is left to attack.
pub struct ScriptedProvider {
    roster: Vec<Arc<RosterParticipant>>,
    rng: Mutex<StdRng>,
    hit_chance: f64,
    wind_up: Duration,
}

impl ScriptedProvider {
    pub fn new(roster: Vec<Arc<RosterParticipant>>, seed: u64) -> Self {
        Self {
            roster,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            hit_chance: 0.75,
            wind_up: Duration::from_millis(200),
        }
    }

    /// Probability in `0.0..=1.0` that a swing lands. Out-of-range values are
    /// clamped.
    pub fn with_hit_chance(mut self, hit_chance: f64) -> Self {
        self.hit_chance = hit_chance.clamp(0.0, 1.0);
        self
    }

    pub fn with_wind_up(mut self, wind_up: Duration) -> Self {
        self.wind_up = wind_up;
        self
    }
}

#[async_trait]
impl DecisionProvider for ScriptedProvider {
    async fn decide(&self, turn: &TurnSnapshot, _encounter: &EncounterSnapshot) -> Result<Decision> {
        let Some(target) = self
            .roster
            .iter()
            .find(|p| p.is_alive() && p.controller() != turn.controller)
        else {
            return Ok(Decision::Pass);
        };

        let hit = self.rng.lock().await.gen_bool(self.hit_chance);
        debug!(
            target: "runtime::provider",
            actor = %turn.name,
            target = %target.name(),
            hit,
            "Scripted decision"
        );

        if hit {
            Ok(Decision::single(KnockoutAction::new(
                Arc::clone(target),
                self.wind_up,
            )))
        } else {
            Ok(Decision::single(
                TimedAction::new(format!("{} misses {}", turn.name, target.name()), self.wind_up)
                    .with_category(ActionCategory::Attack),
            ))
        }
    }
}
