use std::fmt;
use std::time::Duration;

/// Point on the encounter timeline, measured from the moment the owning
/// component was created or reset.
///
/// Every component keeps its own clock and advances it from the host's
/// `tick(delta)`; the orchestrator ticks them together so their timestamps
/// agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub Duration);

impl Timestamp {
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Negative or NaN input is zero; out-of-range input saturates.
    pub fn from_secs_f32(secs: f32) -> Self {
        if secs.is_nan() || secs <= 0.0 {
            return Self::ZERO;
        }
        Self(Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX))
    }

    pub fn as_secs_f32(self) -> f32 {
        self.0.as_secs_f32()
    }

    /// Time elapsed since `earlier`, saturating at zero.
    pub fn since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl std::ops::AddAssign<Duration> for Timestamp {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_add(rhs);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}

/// Counts down a fixed duration across ticks.
///
/// Phase handlers and the action runner use this for waits that must survive
/// several host frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    remaining: Duration,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            remaining: duration,
        }
    }

    /// Consumes `delta` and returns true once the countdown has reached zero.
    pub fn advance(&mut self, delta: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(delta);
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}
