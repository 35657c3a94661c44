//! Roster entries and the participants built from them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use combat_core::{Controller, Participant, ParticipantId, ParticipantRef};

/// One line of a roster file.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RosterEntry {
    pub name: String,
    pub speed: i32,
    pub controller: Controller,
    /// Starting liveness; absent means alive.
    #[cfg_attr(feature = "serde", serde(default))]
    pub alive: Option<bool>,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, speed: i32, controller: Controller) -> Self {
        Self {
            name: name.into(),
            speed,
            controller,
            alive: None,
        }
    }

    pub fn starts_alive(&self) -> bool {
        self.alive.unwrap_or(true)
    }
}

/// Thread-safe participant backed by a roster entry.
///
/// Liveness can be flipped from any thread (actions knock participants out
/// while the encounter runs on a worker task). Turn hooks only count calls.
#[derive(Debug)]
pub struct RosterParticipant {
    id: ParticipantId,
    name: String,
    speed: i32,
    controller: Controller,
    alive: AtomicBool,
    turns_started: AtomicU32,
    turns_ended: AtomicU32,
}

impl RosterParticipant {
    pub fn new(id: ParticipantId, entry: &RosterEntry) -> Self {
        Self {
            id,
            name: entry.name.clone(),
            speed: entry.speed,
            controller: entry.controller,
            alive: AtomicBool::new(entry.starts_alive()),
            turns_started: AtomicU32::new(0),
            turns_ended: AtomicU32::new(0),
        }
    }

    pub fn knock_out(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn revive(&self) {
        self.alive.store(true, Ordering::SeqCst);
    }

    pub fn turns_started(&self) -> u32 {
        self.turns_started.load(Ordering::SeqCst)
    }

    pub fn turns_ended(&self) -> u32 {
        self.turns_ended.load(Ordering::SeqCst)
    }

    pub fn as_participant(self: &Arc<Self>) -> ParticipantRef {
        Arc::clone(self) as ParticipantRef
    }
}

impl Participant for RosterParticipant {
    fn id(&self) -> ParticipantId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn speed(&self) -> i32 {
        self.speed
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn controller(&self) -> Controller {
        self.controller
    }

    fn on_turn_start(&self) {
        self.turns_started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_turn_end(&self) {
        self.turns_ended.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builds participants for `entries`, numbering ids from 1 in roster order.
pub fn build_roster(entries: &[RosterEntry]) -> Vec<Arc<RosterParticipant>> {
    entries
        .iter()
        .zip(1u32..)
        .map(|(entry, id)| Arc::new(RosterParticipant::new(ParticipantId(id), entry)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_roster_order() {
        let roster = build_roster(&[
            RosterEntry::new("Aria", 14, Controller::Player),
            RosterEntry::new("Goblin", 6, Controller::Ai),
        ]);

        assert_eq!(roster[0].id(), ParticipantId(1));
        assert_eq!(roster[1].id(), ParticipantId(2));
        assert_eq!(roster[1].name(), "Goblin");
        assert!(!roster[1].is_player_controlled());
    }

    #[test]
    fn explicit_alive_flag_is_respected() {
        let mut entry = RosterEntry::new("Sentry", 8, Controller::Ai);
        entry.alive = Some(false);
        let sentry = RosterParticipant::new(ParticipantId(9), &entry);
        assert!(!sentry.is_alive());

        sentry.revive();
        assert!(sentry.is_alive());
    }

    #[test]
    fn hooks_count_turns() {
        let hero = RosterParticipant::new(
            ParticipantId(1),
            &RosterEntry::new("Aria", 14, Controller::Player),
        );
        hero.on_turn_start();
        hero.on_turn_end();
        hero.on_turn_start();

        assert_eq!(hero.turns_started(), 2);
        assert_eq!(hero.turns_ended(), 1);
    }
}
