use std::time::Duration;

use crate::scheduler::TurnOrderMode;

/// Combat configuration: tunable parameters for all three core components.
///
/// Durations are stored as `f32` seconds so config files stay readable; use
/// the accessor methods to get [`Duration`]s.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    pub scheduler: SchedulerConfig,
    pub phases: PhaseConfig,
    pub runner: RunnerConfig,
}

/// Turn ordering parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// How the ordered list is sorted.
    pub order: TurnOrderMode,
    /// Upper bound (exclusive) of the random jitter added to speed when
    /// computing initiative. The lower bound is always zero.
    pub initiative_jitter: f32,
    /// Whether a forced end of turn starts the next turn immediately instead
    /// of waiting out the TurnTransition hold.
    pub advance_on_force_end: bool,
}

impl SchedulerConfig {
    pub const DEFAULT_INITIATIVE_JITTER: f32 = 10.0;
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            order: TurnOrderMode::Initiative,
            initiative_jitter: Self::DEFAULT_INITIATIVE_JITTER,
            advance_on_force_end: true,
        }
    }
}

/// Phase-local timing parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhaseConfig {
    /// Seconds WaitingForDecision waits before escalating to TurnTransition.
    /// Enemy turns with nothing queued give up after the same time.
    pub decision_timeout_secs: f32,
    /// Minimum seconds an enemy "thinks" before its actions execute.
    pub enemy_think_secs: f32,
    /// Seconds TurnTransition holds before the next turn is chosen.
    pub transition_hold_secs: f32,
    /// Fixed step for `on_fixed_update`.
    pub fixed_step_secs: f32,
}

impl PhaseConfig {
    pub const DEFAULT_DECISION_TIMEOUT_SECS: f32 = 60.0;
    pub const DEFAULT_ENEMY_THINK_SECS: f32 = 0.5;
    pub const DEFAULT_TRANSITION_HOLD_SECS: f32 = 0.5;
    pub const DEFAULT_FIXED_STEP_SECS: f32 = 0.02;

    /// Upper bound on fixed steps run in one tick, so a long stall cannot
    /// spiral into thousands of catch-up steps.
    pub const MAX_FIXED_STEPS_PER_TICK: u32 = 8;

    pub fn decision_timeout(&self) -> Duration {
        secs(self.decision_timeout_secs)
    }

    pub fn enemy_think(&self) -> Duration {
        secs(self.enemy_think_secs)
    }

    pub fn transition_hold(&self) -> Duration {
        secs(self.transition_hold_secs)
    }

    pub fn fixed_step(&self) -> Duration {
        secs(self.fixed_step_secs)
    }

    /// Zero-length waits everywhere; handy for headless simulation and tests.
    pub fn instant() -> Self {
        Self {
            decision_timeout_secs: Self::DEFAULT_DECISION_TIMEOUT_SECS,
            enemy_think_secs: 0.0,
            transition_hold_secs: 0.0,
            fixed_step_secs: Self::DEFAULT_FIXED_STEP_SECS,
        }
    }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            decision_timeout_secs: Self::DEFAULT_DECISION_TIMEOUT_SECS,
            enemy_think_secs: Self::DEFAULT_ENEMY_THINK_SECS,
            transition_hold_secs: Self::DEFAULT_TRANSITION_HOLD_SECS,
            fixed_step_secs: Self::DEFAULT_FIXED_STEP_SECS,
        }
    }
}

/// Action queue parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunnerConfig {
    /// Maximum number of not-yet-started actions.
    pub capacity: usize,
    /// Seconds to wait between two consecutive actions.
    pub inter_action_delay_secs: f32,
    /// Start executing as soon as an action is enqueued on an idle runner.
    pub auto_execute: bool,
    /// Whether the in-flight action may be cancelled.
    pub allow_cancel: bool,
    /// Number of terminal action records kept for querying.
    pub history_len: usize,
}

impl RunnerConfig {
    pub const DEFAULT_CAPACITY: usize = 50;
    pub const DEFAULT_INTER_ACTION_DELAY_SECS: f32 = 0.1;
    pub const DEFAULT_HISTORY_LEN: usize = 32;

    pub fn inter_action_delay(&self) -> Duration {
        secs(self.inter_action_delay_secs)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            inter_action_delay_secs: Self::DEFAULT_INTER_ACTION_DELAY_SECS,
            auto_execute: true,
            allow_cancel: true,
            history_len: Self::DEFAULT_HISTORY_LEN,
        }
    }
}

// Negative or NaN values in config files collapse to zero; values too large
// for a Duration (including infinity) saturate.
fn secs(value: f32) -> Duration {
    if value.is_nan() || value <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
    }
}
