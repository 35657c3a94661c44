//! Data-driven combat content.
//!
//! This crate provides what a host needs to run encounters from files:
//! - Rosters (RON) and the [`RosterParticipant`] built from each entry
//! - Combat tuning (TOML) deserialized into [`combat_core::CombatConfig`]
//! - Scripted actions ([`TimedAction`], [`KnockoutAction`]) for headless runs
//!
//! Loaders are behind the default `loaders` feature.

pub mod actions;
pub mod roster;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use actions::{KnockoutAction, TimedAction};
pub use roster::{RosterEntry, RosterParticipant, build_roster};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, RosterFile, RosterLoader};
