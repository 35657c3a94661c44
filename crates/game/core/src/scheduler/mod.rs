//! Turn ordering and round progression.
//!
//! [`TurnScheduler`] owns the ordered list of participants and the pending
//! queue for the current round. It decides whose turn it is; it never decides
//! what they do. Turn changes are reported through [`TurnEvent`]s that the
//! orchestrator drains with [`TurnScheduler::drain_events`].

mod entry;
mod errors;
mod jitter;
mod order;

pub use entry::TurnEntry;
pub use errors::SchedulerError;
pub use jitter::{FixedJitter, JitterSource, ScriptedJitter, SeededJitter};
pub use order::TurnOrderMode;

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clock::Timestamp;
use crate::config::SchedulerConfig;
use crate::event::{Outbox, TurnEvent};
use crate::participant::{ParticipantId, ParticipantRef};

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// What a pending-queue rebuild is allowed to include.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rebuild {
    /// A new round: every alive entry, in list order.
    Round,
    /// Composition changed mid-round: only entries that were still waiting.
    Composition,
}

/// Round-robin turn scheduler with initiative, speed, or manual ordering.
pub struct TurnScheduler {
    config: SchedulerConfig,
    jitter: Box<dyn JitterSource>,
    entries: Vec<TurnEntry>,
    pending: VecDeque<ParticipantId>,
    current: Option<ParticipantId>,
    round: u32,
    processing: bool,
    next_admission: u64,
    clock: Timestamp,
    events: Outbox<TurnEvent>,
}

impl TurnScheduler {
    /// Creates a scheduler whose initiative rolls are seeded from OS entropy.
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_jitter(config, Box::new(SeededJitter::from_entropy()))
    }

    pub fn with_jitter(config: SchedulerConfig, jitter: Box<dyn JitterSource>) -> Self {
        Self {
            config,
            jitter,
            entries: Vec::new(),
            pending: VecDeque::new(),
            current: None,
            round: 0,
            processing: false,
            next_admission: 0,
            clock: Timestamp::ZERO,
            events: Outbox::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Resets all scheduling state and admits every alive participant.
    ///
    /// Non-alive participants and duplicate ids are skipped, not errors.
    pub fn initialize(&mut self, participants: impl IntoIterator<Item = ParticipantRef>) {
        self.entries.clear();
        self.pending.clear();
        self.current = None;
        self.round = 0;
        self.processing = false;
        self.next_admission = 0;

        for participant in participants {
            if !participant.is_alive() {
                debug!(
                    target: "combat::scheduler",
                    participant = %participant.id(),
                    "Skipping non-alive participant"
                );
                continue;
            }
            if self.contains(participant.id()) {
                warn!(
                    target: "combat::scheduler",
                    participant = %participant.id(),
                    "Skipping duplicate participant"
                );
                continue;
            }
            let admission = self.take_admission();
            self.entries.push(TurnEntry::new(participant, 0.0, admission));
        }

        self.roll_initiative();
        self.sort_entries();
        self.rebuild_pending(Rebuild::Round);

        info!(
            target: "combat::scheduler",
            participants = self.entries.len(),
            order = %self.config.order,
            "Scheduler initialized"
        );
    }

    /// Adds a participant to a running (or not yet started) encounter.
    ///
    /// Returns `false` if the participant is not alive or already scheduled.
    pub fn admit(&mut self, participant: ParticipantRef) -> bool {
        let id = participant.id();
        if !participant.is_alive() {
            warn!(target: "combat::scheduler", participant = %id, "Refusing to admit non-alive participant");
            return false;
        }
        if self.contains(id) {
            warn!(target: "combat::scheduler", participant = %id, "Participant already scheduled");
            return false;
        }

        let initiative = self.roll_for(participant.speed());
        let admission = self.take_admission();
        let entry = TurnEntry::new(participant, initiative, admission);

        let index = match self.config.order {
            TurnOrderMode::Initiative => order::initiative_insert_position(&self.entries, &entry),
            TurnOrderMode::Speed | TurnOrderMode::Manual => self.entries.len(),
        };
        self.entries.insert(index, entry);
        self.rebuild_pending(Rebuild::Composition);

        info!(
            target: "combat::scheduler",
            participant = %id,
            initiative,
            index,
            "Participant admitted"
        );
        true
    }

    /// Removes a participant. Returns `false` if it was not scheduled.
    ///
    /// Withdrawing the current actor clears the current slot without ending
    /// the turn; call [`advance`](Self::advance) before relying on
    /// [`current`](Self::current) again.
    pub fn withdraw(&mut self, id: ParticipantId) -> bool {
        let Some(index) = self.index_of(id) else {
            debug!(target: "combat::scheduler", participant = %id, "Withdraw of unknown participant");
            return false;
        };

        self.entries.remove(index);
        if self.current == Some(id) {
            self.current = None;
        }
        self.rebuild_pending(Rebuild::Composition);

        info!(target: "combat::scheduler", participant = %id, "Participant withdrawn");
        true
    }

    /// Starts round 1 and hands the first turn out.
    pub fn start_encounter(&mut self) -> Result<ParticipantId> {
        if self.alive_count() == 0 {
            error!(target: "combat::scheduler", "Cannot start encounter without alive participants");
            return Err(SchedulerError::NoAliveParticipants);
        }

        self.current = None;
        self.round = 1;
        self.rebuild_pending(Rebuild::Round);
        info!(target: "combat::scheduler", "Encounter started");

        self.advance()
    }

    /// Ends the current turn (if any) and makes the next alive participant
    /// current, rolling into a new round when the pending queue runs out.
    pub fn advance(&mut self) -> Result<ParticipantId> {
        if self.processing {
            warn!(target: "combat::scheduler", "advance() called while already advancing");
            return Err(SchedulerError::AlreadyAdvancing);
        }
        if self.round == 0 {
            warn!(target: "combat::scheduler", "advance() called before the encounter started");
            return Err(SchedulerError::NotStarted);
        }

        self.processing = true;
        let result = self.advance_inner();
        self.processing = false;
        result
    }

    fn advance_inner(&mut self) -> Result<ParticipantId> {
        self.end_current_turn();

        let mut rolled_over = false;
        loop {
            while let Some(id) = self.pending.pop_front() {
                let Some(index) = self.index_of(id) else {
                    continue;
                };
                if !self.entries[index].is_alive() {
                    debug!(
                        target: "combat::scheduler",
                        participant = %id,
                        "Skipping participant that died while queued"
                    );
                    continue;
                }
                self.begin_turn(index);
                return Ok(id);
            }

            if rolled_over {
                error!(
                    target: "combat::scheduler",
                    round = self.round,
                    "No alive participants left to schedule"
                );
                return Err(SchedulerError::NoAliveParticipants);
            }

            self.complete_round();
            rolled_over = true;
        }
    }

    /// Ends the current turn and, if configured, advances immediately.
    ///
    /// Returns the new current participant when an advance happened.
    pub fn force_end_current_turn(&mut self) -> Result<Option<ParticipantId>> {
        match self.end_current_turn() {
            Some(id) => info!(target: "combat::scheduler", participant = %id, "Turn force-ended"),
            None => warn!(target: "combat::scheduler", "Force end requested with no current turn"),
        }

        if self.config.advance_on_force_end && self.round > 0 {
            self.advance().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Ends the current turn without advancing. Returns the participant whose
    /// turn ended.
    pub fn end_current_turn(&mut self) -> Option<ParticipantId> {
        let id = self.current.take()?;
        let index = self.index_of(id)?;
        let clock = self.clock;
        let round = self.round;

        let entry = &mut self.entries[index];
        entry.turn_ended_at = Some(clock);
        entry.participant().on_turn_end();
        let snapshot = entry.snapshot(round, clock);

        debug!(
            target: "combat::scheduler",
            participant = %id,
            actions = snapshot.actions_performed,
            "Turn ended"
        );
        self.events.push(TurnEvent::TurnEnded(snapshot));
        Some(id)
    }

    /// Counts one performed action against the current turn.
    pub fn record_action(&mut self) {
        if let Some(index) = self.current.and_then(|id| self.index_of(id)) {
            self.entries[index].actions_performed += 1;
        }
    }

    /// Advances the scheduler's clock used for turn timestamps.
    pub fn tick(&mut self, delta: Duration) {
        self.clock += delta;
    }

    pub fn drain_events(&mut self) -> Vec<TurnEvent> {
        self.events.drain()
    }

    // ===== queries =====

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn current(&self) -> Option<&TurnEntry> {
        self.current.and_then(|id| self.entry(id))
    }

    pub fn current_id(&self) -> Option<ParticipantId> {
        self.current
    }

    pub fn current_participant(&self) -> Option<&ParticipantRef> {
        self.current().map(TurnEntry::participant)
    }

    /// Ordered entry list, including entries that are no longer alive.
    pub fn order(&self) -> &[TurnEntry] {
        &self.entries
    }

    /// Participants still waiting for their turn this round.
    pub fn pending(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.pending.iter().copied()
    }

    pub fn entry(&self, id: ParticipantId) -> Option<&TurnEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn is_turn_of(&self, id: ParticipantId) -> bool {
        self.current == Some(id)
    }

    pub fn alive_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_alive()).count()
    }

    /// The participant that would act after the current one, if nobody dies
    /// in between. Crossing into the next round ignores the initiative reroll.
    pub fn peek_next(&self) -> Option<&ParticipantRef> {
        self.upcoming_entries().next().map(TurnEntry::participant)
    }

    /// Preview of the next `count` turns, wrapping into following rounds.
    ///
    /// Later rounds are approximated with the current order since initiative
    /// is rerolled when a round begins.
    pub fn upcoming(&self, count: usize) -> Vec<ParticipantRef> {
        if self.alive_count() == 0 {
            return Vec::new();
        }
        self.upcoming_entries()
            .take(count)
            .map(|entry| entry.participant().clone())
            .collect()
    }

    fn upcoming_entries(&self) -> impl Iterator<Item = &TurnEntry> + '_ {
        let this_round = self
            .pending
            .iter()
            .filter_map(|id| self.entry(*id))
            .filter(|entry| entry.is_alive());
        let later_rounds = self.entries.iter().filter(|entry| entry.is_alive()).cycle();
        this_round.chain(later_rounds)
    }

    // ===== internals =====

    fn begin_turn(&mut self, index: usize) {
        let clock = self.clock;
        let round = self.round;

        let entry = &mut self.entries[index];
        entry.turn_started_at = Some(clock);
        entry.turn_ended_at = None;
        entry.actions_performed = 0;
        entry.participant().on_turn_start();
        let snapshot = entry.snapshot(round, clock);
        self.current = Some(snapshot.participant);

        debug!(
            target: "combat::scheduler",
            participant = %snapshot.participant,
            round,
            initiative = snapshot.initiative,
            "Turn started"
        );
        self.events.push(TurnEvent::TurnStarted(snapshot));
    }

    fn complete_round(&mut self) {
        info!(target: "combat::scheduler", round = self.round, "Round completed");
        self.events
            .push(TurnEvent::RoundCompleted { round: self.round });

        self.round += 1;
        self.roll_initiative();
        self.sort_entries();
        self.rebuild_pending(Rebuild::Round);
    }

    fn rebuild_pending(&mut self, scope: Rebuild) {
        let waiting: Option<HashSet<ParticipantId>> = match scope {
            Rebuild::Composition if self.round > 0 => Some(self.pending.iter().copied().collect()),
            _ => None,
        };

        self.pending = self
            .entries
            .iter()
            .filter(|entry| entry.is_alive())
            .map(TurnEntry::id)
            .filter(|id| waiting.as_ref().is_none_or(|set| set.contains(id)))
            .collect();

        self.events.push(TurnEvent::QueueUpdated {
            pending: self.pending.iter().copied().collect(),
        });
    }

    fn roll_initiative(&mut self) {
        let max = self.config.initiative_jitter;
        for entry in &mut self.entries {
            entry.initiative = entry.speed() as f32 + self.jitter.roll(max);
        }
    }

    fn roll_for(&mut self, speed: i32) -> f32 {
        speed as f32 + self.jitter.roll(self.config.initiative_jitter)
    }

    fn sort_entries(&mut self) {
        let mode = self.config.order;
        if mode.resorts() {
            self.entries.sort_by(|a, b| order::compare(mode, a, b));
        }
    }

    fn take_admission(&mut self) -> u64 {
        let admission = self.next_admission;
        self.next_admission += 1;
        admission
    }

    fn index_of(&self, id: ParticipantId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Dummy, refs};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn scheduler(order: TurnOrderMode) -> TurnScheduler {
        TurnScheduler::with_jitter(
            SchedulerConfig {
                order,
                ..SchedulerConfig::default()
            },
            Box::new(FixedJitter(0.0)),
        )
    }

    fn order_ids(scheduler: &TurnScheduler) -> Vec<u32> {
        scheduler.order().iter().map(|e| e.id().0).collect()
    }

    fn pending_ids(scheduler: &TurnScheduler) -> Vec<u32> {
        scheduler.pending().map(|id| id.0).collect()
    }

    #[test]
    fn equal_initiative_breaks_ties_by_admission() {
        let party = [Dummy::ai(1, 10), Dummy::ai(2, 10), Dummy::ai(3, 5)];
        let mut scheduler = scheduler(TurnOrderMode::Initiative);
        scheduler.initialize(refs(&party));

        assert_eq!(order_ids(&scheduler), vec![1, 2, 3]);
    }

    #[test]
    fn equal_initiative_prefers_higher_speed() {
        let party = [Dummy::ai(1, 5), Dummy::ai(2, 7)];
        // 5 + 4.0 == 7 + 2.0
        let mut scheduler = TurnScheduler::with_jitter(
            SchedulerConfig::default(),
            Box::new(ScriptedJitter::new(vec![4.0, 2.0])),
        );
        scheduler.initialize(refs(&party));

        assert_eq!(order_ids(&scheduler), vec![2, 1]);
    }

    #[test]
    fn initialize_excludes_dead_and_duplicate_participants() {
        let a = Dummy::ai(1, 10);
        let b = Dummy::ai(2, 8);
        b.kill();
        let mut participants = refs(&[a.clone(), b]);
        participants.push(a);

        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(participants);

        assert_eq!(order_ids(&scheduler), vec![1]);
        assert_eq!(scheduler.round(), 0);
    }

    #[test]
    fn start_without_alive_participants_fails() {
        let mut scheduler = scheduler(TurnOrderMode::Initiative);
        scheduler.initialize(Vec::new());

        assert_eq!(
            scheduler.start_encounter(),
            Err(SchedulerError::NoAliveParticipants)
        );
        assert_eq!(scheduler.round(), 0);
        assert!(scheduler.current().is_none());
    }

    #[test]
    fn advance_before_start_is_rejected() {
        let mut scheduler = scheduler(TurnOrderMode::Initiative);
        scheduler.initialize(refs(&[Dummy::ai(1, 1)]));
        assert_eq!(scheduler.advance(), Err(SchedulerError::NotStarted));
    }

    #[test]
    fn each_round_visits_alive_participants_once() {
        let party = [Dummy::ai(1, 3), Dummy::ai(2, 9), Dummy::ai(3, 6)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));

        let mut seen = vec![scheduler.start_encounter().unwrap().0];
        assert_eq!(scheduler.round(), 1);
        for _ in 0..5 {
            seen.push(scheduler.advance().unwrap().0);
        }

        assert_eq!(seen, vec![2, 3, 1, 2, 3, 1]);
        assert_eq!(scheduler.round(), 2);
    }

    #[test]
    fn dead_participants_are_skipped() {
        let party = [Dummy::ai(1, 9), Dummy::ai(2, 6), Dummy::ai(3, 3)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();

        party[1].kill();
        assert_eq!(scheduler.advance().unwrap(), ParticipantId(3));
        assert_eq!(scheduler.advance().unwrap(), ParticipantId(1));
        assert_eq!(scheduler.advance().unwrap(), ParticipantId(3));
    }

    #[test]
    fn round_rollover_emits_round_completed() {
        let party = [Dummy::ai(1, 9)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();
        scheduler.drain_events();

        scheduler.advance().unwrap();
        let events = scheduler.drain_events();

        assert!(matches!(events[0], TurnEvent::TurnEnded(ref s) if s.round == 1));
        assert!(events.contains(&TurnEvent::RoundCompleted { round: 1 }));
        assert!(matches!(events.last(), Some(TurnEvent::TurnStarted(s)) if s.round == 2));
    }

    #[test]
    fn advance_fails_when_everyone_died() {
        let party = [Dummy::ai(1, 9), Dummy::ai(2, 4)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();

        party[0].kill();
        party[1].kill();

        assert_eq!(
            scheduler.advance(),
            Err(SchedulerError::NoAliveParticipants)
        );
        assert!(scheduler.current().is_none());
        assert!(!scheduler.is_processing());
    }

    #[test]
    fn turn_hooks_fire_once_per_turn() {
        let party = [Dummy::ai(1, 9), Dummy::ai(2, 4)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();
        scheduler.advance().unwrap();

        assert_eq!(party[0].starts.load(Ordering::SeqCst), 1);
        assert_eq!(party[0].ends.load(Ordering::SeqCst), 1);
        assert_eq!(party[1].starts.load(Ordering::SeqCst), 1);
        assert_eq!(party[1].ends.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn turn_timestamps_follow_the_clock() {
        let party = [Dummy::ai(1, 9), Dummy::ai(2, 4)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();
        scheduler.tick(Duration::from_secs(2));
        scheduler.record_action();
        scheduler.advance().unwrap();

        let first = scheduler.entry(ParticipantId(1)).unwrap();
        assert_eq!(first.turn_started_at(), Some(Timestamp::ZERO));
        assert_eq!(
            first.turn_ended_at(),
            Some(Timestamp(Duration::from_secs(2)))
        );
        assert_eq!(first.actions_performed(), 1);
        assert_eq!(scheduler.current().unwrap().actions_performed(), 0);
    }

    #[test]
    fn admit_mid_round_joins_next_round() {
        let party = [Dummy::ai(1, 10), Dummy::ai(2, 10), Dummy::ai(3, 5)];
        let mut scheduler = scheduler(TurnOrderMode::Initiative);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();

        let fast = Dummy::ai(4, 50);
        assert!(scheduler.admit(fast));

        assert_eq!(order_ids(&scheduler), vec![4, 1, 2, 3]);
        assert_eq!(pending_ids(&scheduler), vec![2, 3]);

        assert_eq!(scheduler.advance().unwrap(), ParticipantId(2));
        assert_eq!(scheduler.advance().unwrap(), ParticipantId(3));
        assert_eq!(scheduler.advance().unwrap(), ParticipantId(4));
    }

    #[test]
    fn admit_before_start_joins_first_round() {
        let mut scheduler = scheduler(TurnOrderMode::Manual);
        scheduler.initialize(refs(&[Dummy::ai(1, 1)]));
        assert!(scheduler.admit(Dummy::ai(2, 99)));

        assert_eq!(order_ids(&scheduler), vec![1, 2]);
        assert_eq!(pending_ids(&scheduler), vec![1, 2]);
    }

    #[test]
    fn admit_after_equal_entries_under_initiative() {
        let mut scheduler = scheduler(TurnOrderMode::Initiative);
        scheduler.initialize(refs(&[Dummy::ai(1, 10), Dummy::ai(2, 5)]));
        scheduler.admit(Dummy::ai(3, 10));

        assert_eq!(order_ids(&scheduler), vec![1, 3, 2]);
    }

    #[test]
    fn admit_appends_under_speed_ordering() {
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&[Dummy::ai(1, 10), Dummy::ai(2, 5)]));
        scheduler.admit(Dummy::ai(3, 50));

        assert_eq!(order_ids(&scheduler), vec![1, 2, 3]);
    }

    #[test]
    fn admit_rejects_dead_and_duplicates() {
        let a = Dummy::ai(1, 10);
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&[a.clone()]));

        assert!(!scheduler.admit(a));
        let dead = Dummy::ai(2, 1);
        dead.kill();
        assert!(!scheduler.admit(dead));
        assert_eq!(scheduler.order().len(), 1);
    }

    #[test]
    fn manual_order_is_never_resorted() {
        let party = [Dummy::ai(1, 1), Dummy::ai(2, 50), Dummy::ai(3, 20)];
        let mut scheduler = scheduler(TurnOrderMode::Manual);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();
        for _ in 0..3 {
            scheduler.advance().unwrap();
        }

        assert_eq!(order_ids(&scheduler), vec![1, 2, 3]);
        assert_eq!(scheduler.current_id(), Some(ParticipantId(2)));
    }

    #[test]
    fn initiative_is_rerolled_each_round() {
        let party = [Dummy::ai(1, 10), Dummy::ai(2, 10)];
        let mut scheduler = TurnScheduler::with_jitter(
            SchedulerConfig::default(),
            // Rolls follow list order. Round 1: p1 = 11, p2 = 12.
            // Round 2 (list is [p2, p1]): p2 = 10, p1 = 19.
            Box::new(ScriptedJitter::new(vec![1.0, 2.0, 0.0, 9.0])),
        );
        scheduler.initialize(refs(&party));
        assert_eq!(order_ids(&scheduler), vec![2, 1]);

        scheduler.start_encounter().unwrap();
        scheduler.advance().unwrap();
        scheduler.advance().unwrap();

        assert_eq!(scheduler.round(), 2);
        assert_eq!(order_ids(&scheduler), vec![1, 2]);
        assert_eq!(scheduler.current_id(), Some(ParticipantId(1)));
    }

    #[test]
    fn withdraw_current_clears_slot_without_ending_turn() {
        let party = [Dummy::ai(1, 9), Dummy::ai(2, 4)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();

        assert!(scheduler.withdraw(ParticipantId(1)));
        assert!(scheduler.current().is_none());
        assert_eq!(party[0].ends.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.advance().unwrap(), ParticipantId(2));
        assert!(!scheduler.withdraw(ParticipantId(1)));
    }

    #[test]
    fn withdraw_waiting_participant_removes_it_from_pending() {
        let party = [Dummy::ai(1, 9), Dummy::ai(2, 6), Dummy::ai(3, 3)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();

        scheduler.withdraw(ParticipantId(2));
        assert_eq!(pending_ids(&scheduler), vec![3]);
        assert_eq!(scheduler.advance().unwrap(), ParticipantId(3));
    }

    #[test]
    fn force_end_advances_when_configured() {
        let party = [Dummy::ai(1, 9), Dummy::ai(2, 4)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();

        assert_eq!(
            scheduler.force_end_current_turn(),
            Ok(Some(ParticipantId(2)))
        );
    }

    #[test]
    fn force_end_without_advance_leaves_no_current() {
        let party = [Dummy::ai(1, 9), Dummy::ai(2, 4)];
        let mut scheduler = TurnScheduler::with_jitter(
            SchedulerConfig {
                order: TurnOrderMode::Speed,
                advance_on_force_end: false,
                ..SchedulerConfig::default()
            },
            Box::new(FixedJitter(0.0)),
        );
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();

        assert_eq!(scheduler.force_end_current_turn(), Ok(None));
        assert!(scheduler.current().is_none());
        assert_eq!(party[0].ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn queries_do_not_mutate() {
        let party = [Dummy::ai(1, 9), Dummy::ai(2, 6), Dummy::ai(3, 3)];
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&party));
        scheduler.start_encounter().unwrap();
        scheduler.drain_events();

        assert_eq!(scheduler.peek_next().map(|p| p.id()), Some(ParticipantId(2)));
        let preview: Vec<u32> = scheduler.upcoming(5).iter().map(|p| p.id().0).collect();
        assert_eq!(preview, vec![2, 3, 1, 2, 3]);
        assert!(scheduler.is_turn_of(ParticipantId(1)));
        assert!(scheduler.contains(ParticipantId(3)));

        assert_eq!(pending_ids(&scheduler), vec![2, 3]);
        assert!(scheduler.drain_events().is_empty());
    }

    #[test]
    fn upcoming_is_empty_without_alive_participants() {
        let lone = Dummy::ai(1, 1);
        let mut scheduler = scheduler(TurnOrderMode::Speed);
        scheduler.initialize(refs(&[lone.clone()]));
        lone.kill();

        assert!(scheduler.upcoming(3).is_empty());
        assert!(scheduler.peek_next().is_none());
    }

    #[test]
    fn turn_started_snapshot_carries_entry_data() {
        let hero = Dummy::player(7, 12);
        let mut scheduler = scheduler(TurnOrderMode::Initiative);
        scheduler.initialize(vec![Arc::clone(&hero) as ParticipantRef]);
        scheduler.start_encounter().unwrap();

        let started = scheduler
            .drain_events()
            .into_iter()
            .find_map(|event| match event {
                TurnEvent::TurnStarted(snapshot) => Some(snapshot),
                _ => None,
            })
            .unwrap();
        assert_eq!(started.participant, ParticipantId(7));
        assert_eq!(started.name, "p7");
        assert_eq!(started.initiative, 12.0);
        assert_eq!(started.round, 1);
    }
}
