//! Topic-based event bus for encounter notifications.
//!
//! The worker publishes every drained [`combat_core::CombatEvent`] to the
//! topic of its component, and consumers subscribe only to what they need.

mod bus;

pub use bus::{Event, EventBus, Topic};
