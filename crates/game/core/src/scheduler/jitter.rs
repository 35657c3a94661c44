//! Random jitter sources for initiative rolls.
//!
//! Initiative is `speed + jitter`, with jitter uniform in `[0, max)`. The
//! source is pluggable so hosts can seed it for replays and tests can pin it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the random part of an initiative roll.
pub trait JitterSource: Send {
    /// Returns a value in `[0, max)`. Must return `0.0` when `max <= 0`.
    fn roll(&mut self, max: f32) -> f32;
}

/// Seeded uniform jitter backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct SeededJitter {
    rng: StdRng,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl JitterSource for SeededJitter {
    fn roll(&mut self, max: f32) -> f32 {
        if !(max > 0.0) {
            return 0.0;
        }
        self.rng.gen_range(0.0..max)
    }
}

/// Constant jitter, clamped into `[0, max)`. `FixedJitter(0.0)` makes
/// initiative equal to speed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub f32);

impl JitterSource for FixedJitter {
    fn roll(&mut self, max: f32) -> f32 {
        if !(max > 0.0) {
            return 0.0;
        }
        if self.0 >= max {
            // Largest value strictly below `max`.
            return f32::from_bits(max.to_bits() - 1);
        }
        self.0.max(0.0)
    }
}

/// Replays a fixed sequence of rolls, then keeps returning the last one.
#[derive(Debug, Clone)]
pub struct ScriptedJitter {
    rolls: Vec<f32>,
    next: usize,
}

impl ScriptedJitter {
    pub fn new(rolls: impl Into<Vec<f32>>) -> Self {
        Self {
            rolls: rolls.into(),
            next: 0,
        }
    }
}

impl JitterSource for ScriptedJitter {
    fn roll(&mut self, max: f32) -> f32 {
        let value = match self.rolls.get(self.next) {
            Some(value) => {
                self.next += 1;
                *value
            }
            None => self.rolls.last().copied().unwrap_or(0.0),
        };
        FixedJitter(value).roll(max)
    }
}
