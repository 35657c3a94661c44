//! Sequential action execution.
//!
//! The runner owns a bounded FIFO of submitted actions and executes them one at
//! a time. Execution is driven by [`ActionRunner::tick`]: the in-flight action
//! is polled, the inter-action delay counts down, and once both allow it the
//! next entry is dequeued.
//!
//! Priority is recorded on every entry but never changes the order in which
//! entries run.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{Countdown, Timestamp};
use crate::config::RunnerConfig;
use crate::event::{ActionEvent, Outbox};

use super::{
    ActionContext, ActionId, ActionPoll, ActionStatus, CombatAction, EnqueueError, QueuedAction,
    UndoError,
};

const VALIDATION_FAILED: &str = "pre-execution check failed";

pub struct ActionRunner {
    config: RunnerConfig,
    queue: VecDeque<QueuedAction>,
    current: Option<QueuedAction>,
    history: VecDeque<QueuedAction>,
    executing: bool,
    paused: bool,
    cooldown: Countdown,
    clock: Timestamp,
    next_id: u64,
    events: Outbox<ActionEvent>,
}

impl ActionRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            current: None,
            history: VecDeque::new(),
            executing: false,
            paused: false,
            cooldown: Countdown::new(Duration::ZERO),
            clock: Timestamp::ZERO,
            next_id: 0,
            events: Outbox::new(),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Appends an action to the queue.
    ///
    /// Starts execution immediately when auto-execution is enabled and the
    /// runner is idle and not paused.
    pub fn enqueue(
        &mut self,
        action: Box<dyn CombatAction>,
        priority: i32,
    ) -> Result<ActionId, EnqueueError> {
        if self.queue.len() >= self.config.capacity {
            warn!(
                target: "combat::runner",
                action = action.name(),
                capacity = self.config.capacity,
                "Action queue full, submission rejected"
            );
            return Err(EnqueueError::QueueFull {
                capacity: self.config.capacity,
            });
        }

        let id = ActionId(self.next_id);
        self.next_id += 1;

        let entry = QueuedAction::new(id, action, priority, self.clock);
        debug!(
            target: "combat::runner",
            %id,
            action = entry.name(),
            priority,
            queued = self.queue.len() + 1,
            "Action queued"
        );
        self.events.push(ActionEvent::Queued(entry.tag()));
        self.queue.push_back(entry);

        if self.config.auto_execute && !self.executing && !self.paused {
            self.start();
        }
        Ok(id)
    }

    /// Enqueues each action in order and returns how many were accepted.
    /// A rejection does not undo earlier acceptances.
    pub fn enqueue_many<I>(&mut self, actions: I, priority: i32) -> usize
    where
        I: IntoIterator<Item = Box<dyn CombatAction>>,
    {
        actions
            .into_iter()
            .map(|action| self.enqueue(action, priority))
            .filter(Result::is_ok)
            .count()
    }

    /// Discards every entry that has not started. Returns the number dropped.
    pub fn clear_queue(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        debug!(target: "combat::runner", discarded, "Action queue cleared");
        self.events.push(ActionEvent::QueueCleared { discarded });
        discarded
    }

    /// Clears the queue and, when cancellation is allowed, the in-flight action.
    pub fn clear_all(&mut self) {
        self.clear_queue();
        if self.current.is_some() && self.config.allow_cancel {
            self.cancel_current();
        }
    }

    pub fn start(&mut self) {
        if self.executing {
            warn!(target: "combat::runner", "Runner already executing");
            return;
        }
        if self.queue.is_empty() {
            debug!(target: "combat::runner", "Nothing queued, start ignored");
            return;
        }
        info!(target: "combat::runner", queued = self.queue.len(), "Runner started");
        self.executing = true;
        self.paused = false;
        self.pump();
    }

    /// Holds the next dequeue. An in-flight action keeps running.
    pub fn pause(&mut self) {
        if !self.executing || self.paused {
            warn!(
                target: "combat::runner",
                executing = self.executing,
                paused = self.paused,
                "Pause ignored"
            );
            return;
        }
        debug!(target: "combat::runner", "Runner paused");
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if !self.paused {
            warn!(target: "combat::runner", "Resume ignored, runner not paused");
            return;
        }
        debug!(target: "combat::runner", "Runner resumed");
        self.paused = false;
        self.pump();
    }

    /// Halts execution. The in-flight action is cancelled; queued entries
    /// stay for a later [`start`](Self::start).
    pub fn stop(&mut self) {
        if !self.executing {
            warn!(target: "combat::runner", "Stop ignored, runner not executing");
            return;
        }
        info!(target: "combat::runner", kept = self.queue.len(), "Runner stopped");
        self.executing = false;
        self.paused = false;
        self.cooldown = Countdown::new(Duration::ZERO);
        if let Some(entry) = self.current.take() {
            self.cancel_entry(entry);
        }
    }

    /// Cancels the in-flight action. Returns false (and changes nothing) when
    /// nothing is in flight or cancellation is disabled.
    pub fn cancel_current(&mut self) -> bool {
        if !self.config.allow_cancel {
            warn!(target: "combat::runner", "Cancellation disabled");
            return false;
        }
        let Some(entry) = self.current.take() else {
            warn!(target: "combat::runner", "No action in flight to cancel");
            return false;
        };
        self.cancel_entry(entry);
        self.cooldown = Countdown::new(self.config.inter_action_delay());
        true
    }

    /// Invokes the undo hook of the most recent completed action still in
    /// history. A successful undo removes it from history.
    pub fn undo_last(&mut self) -> Result<ActionId, UndoError> {
        let index = self
            .history
            .iter()
            .rposition(|entry| entry.status == ActionStatus::Completed)
            .ok_or(UndoError::NothingToUndo)?;

        let entry = &mut self.history[index];
        let id = entry.id();
        entry.action_mut().undo()?;
        info!(target: "combat::runner", %id, action = entry.name(), "Action undone");
        self.history.remove(index);
        Ok(id)
    }

    /// Advances the runner clock, drives the in-flight action and dequeues
    /// the next entry when allowed.
    pub fn tick(&mut self, delta: Duration) {
        self.clock += delta;

        let finished = match self.current.as_mut() {
            Some(entry) => {
                let started = entry.started_at.unwrap_or(self.clock);
                let ctx = ActionContext {
                    id: entry.id(),
                    now: self.clock,
                    delta,
                    elapsed: self.clock.since(started),
                };
                entry.action_mut().poll(&ctx) == ActionPoll::Complete
            }
            None => {
                self.cooldown.advance(delta);
                false
            }
        };
        if finished {
            if let Some(entry) = self.current.take() {
                self.complete(entry);
            }
        }

        self.pump();
    }

    pub fn drain_events(&mut self) -> Vec<ActionEvent> {
        self.events.drain()
    }

    /// Drops all state. The in-flight action gets its cancel hook; no
    /// notifications are emitted.
    pub fn reset(&mut self) {
        if let Some(mut entry) = self.current.take() {
            entry.action_mut().cancel();
        }
        self.queue.clear();
        self.history.clear();
        self.executing = false;
        self.paused = false;
        self.cooldown = Countdown::new(Duration::ZERO);
        self.clock = Timestamp::ZERO;
        self.events.clear();
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn current(&self) -> Option<&QueuedAction> {
        self.current.as_ref()
    }

    /// Queued entries in execution (FIFO) order.
    pub fn pending(&self) -> impl Iterator<Item = &QueuedAction> {
        self.queue.iter()
    }

    /// Queued entries sorted by priority, highest first, ties in FIFO order.
    /// Does not reflect execution order.
    pub fn pending_by_priority(&self) -> Vec<&QueuedAction> {
        let mut entries: Vec<_> = self.queue.iter().collect();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.priority()));
        entries
    }

    /// Terminal entries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &QueuedAction> {
        self.history.iter()
    }

    fn pump(&mut self) {
        loop {
            if !self.executing
                || self.paused
                || self.current.is_some()
                || !self.cooldown.is_finished()
            {
                return;
            }

            let Some(mut entry) = self.queue.pop_front() else {
                self.executing = false;
                info!(target: "combat::runner", "Action queue empty");
                self.events.push(ActionEvent::QueueEmpty);
                return;
            };

            entry.status = ActionStatus::Executing;
            entry.started_at = Some(self.clock);
            debug!(target: "combat::runner", id = %entry.id(), action = entry.name(), "Action started");
            self.events.push(ActionEvent::Started(entry.tag()));

            if !entry.action_mut().can_execute() {
                warn!(
                    target: "combat::runner",
                    id = %entry.id(),
                    action = entry.name(),
                    "Action failed validation"
                );
                entry.status = ActionStatus::Failed;
                entry.ended_at = Some(self.clock);
                self.events.push(ActionEvent::Failed {
                    action: entry.tag(),
                    reason: VALIDATION_FAILED.to_owned(),
                });
                self.retire(entry);
                continue;
            }

            let ctx = ActionContext {
                id: entry.id(),
                now: self.clock,
                delta: Duration::ZERO,
                elapsed: Duration::ZERO,
            };
            match entry.action_mut().execute(&ctx) {
                ActionPoll::Pending => self.current = Some(entry),
                ActionPoll::Complete => self.complete(entry),
            }
        }
    }

    fn complete(&mut self, mut entry: QueuedAction) {
        entry.status = ActionStatus::Completed;
        entry.ended_at = Some(self.clock);
        debug!(target: "combat::runner", id = %entry.id(), action = entry.name(), "Action completed");
        self.events.push(ActionEvent::Completed(entry.tag()));
        self.retire(entry);
        self.cooldown = Countdown::new(self.config.inter_action_delay());
    }

    fn cancel_entry(&mut self, mut entry: QueuedAction) {
        entry.action_mut().cancel();
        entry.status = ActionStatus::Cancelled;
        entry.ended_at = Some(self.clock);
        info!(target: "combat::runner", id = %entry.id(), action = entry.name(), "Action cancelled");
        self.events.push(ActionEvent::Cancelled(entry.tag()));
        self.retire(entry);
    }

    fn retire(&mut self, entry: QueuedAction) {
        if self.config.history_len == 0 {
            return;
        }
        while self.history.len() >= self.config.history_len {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Stub, entries, journal};

    const STEP: Duration = Duration::from_millis(250);

    fn manual() -> ActionRunner {
        ActionRunner::new(RunnerConfig {
            auto_execute: false,
            ..RunnerConfig::default()
        })
    }

    fn run_out(runner: &mut ActionRunner) {
        for _ in 0..40 {
            runner.tick(STEP);
        }
    }

    fn count(events: &[ActionEvent], pred: impl Fn(&ActionEvent) -> bool) -> usize {
        events.iter().filter(|event| pred(event)).count()
    }

    #[test]
    fn fifty_first_enqueue_is_rejected() {
        let log = journal();
        let mut runner = manual();
        for i in 0..50 {
            runner.enqueue(Stub::new(&format!("a{i}"), 0, &log), 0).unwrap();
        }
        assert_eq!(
            runner.enqueue(Stub::new("overflow", 0, &log), 0),
            Err(EnqueueError::QueueFull { capacity: 50 })
        );
        assert_eq!(runner.queue_len(), 50);
    }

    #[test]
    fn execution_is_fifo_regardless_of_priority() {
        let log = journal();
        let mut runner = manual();
        runner.enqueue(Stub::new("low", 0, &log), 0).unwrap();
        runner.enqueue(Stub::new("high", 0, &log), 10).unwrap();
        runner.enqueue(Stub::new("mid", 0, &log), 5).unwrap();

        let by_priority: Vec<_> = runner.pending_by_priority().iter().map(|e| e.name().to_owned()).collect();
        assert_eq!(by_priority, vec!["high", "mid", "low"]);

        runner.start();
        run_out(&mut runner);

        assert_eq!(
            entries(&log),
            vec![
                "low:execute",
                "low:done",
                "high:execute",
                "high:done",
                "mid:execute",
                "mid:done"
            ]
        );
    }

    #[test]
    fn cancelling_first_of_three_completes_the_rest() {
        let log = journal();
        let mut runner = ActionRunner::new(RunnerConfig::default());
        runner.enqueue(Stub::new("a", 3, &log), 0).unwrap();
        runner.enqueue(Stub::new("b", 1, &log), 0).unwrap();
        runner.enqueue(Stub::new("c", 1, &log), 0).unwrap();
        assert!(runner.is_executing());
        assert_eq!(runner.current().map(|e| e.name()), Some("a"));

        assert!(runner.cancel_current());
        run_out(&mut runner);

        let events = runner.drain_events();
        let completed: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                ActionEvent::Completed(tag) => Some(tag.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec!["b", "c"]);
        assert_eq!(count(&events, |e| matches!(e, ActionEvent::Cancelled(t) if t.name == "a")), 1);
        assert_eq!(count(&events, |e| matches!(e, ActionEvent::QueueEmpty)), 1);
        assert_eq!(events.last(), Some(&ActionEvent::QueueEmpty));
        assert!(!entries(&log).contains(&"a:done".to_owned()));

        let statuses: Vec<_> = runner.history().map(|e| (e.name().to_owned(), e.status())).collect();
        assert_eq!(
            statuses,
            vec![
                ("a".to_owned(), ActionStatus::Cancelled),
                ("b".to_owned(), ActionStatus::Completed),
                ("c".to_owned(), ActionStatus::Completed),
            ]
        );
        assert!(!runner.is_executing());
    }

    #[test]
    fn failed_validation_reports_and_continues() {
        let log = journal();
        let mut runner = manual();
        runner.enqueue(Stub::invalid("bad", &log), 0).unwrap();
        runner.enqueue(Stub::new("good", 0, &log), 0).unwrap();
        runner.start();
        run_out(&mut runner);

        let events = runner.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            ActionEvent::Failed { action, reason } if action.name == "bad" && reason == VALIDATION_FAILED
        )));
        assert_eq!(count(&events, |e| matches!(e, ActionEvent::Completed(t) if t.name == "good")), 1);
        assert_eq!(entries(&log), vec!["good:execute", "good:done"]);
    }

    #[test]
    fn inter_action_delay_spaces_dequeues() {
        let log = journal();
        let mut runner = ActionRunner::new(RunnerConfig {
            auto_execute: false,
            inter_action_delay_secs: 1.0,
            ..RunnerConfig::default()
        });
        runner.enqueue(Stub::new("first", 0, &log), 0).unwrap();
        runner.enqueue(Stub::new("second", 0, &log), 0).unwrap();
        runner.start();
        assert_eq!(entries(&log), vec!["first:execute", "first:done"]);

        runner.tick(Duration::from_millis(500));
        assert_eq!(entries(&log).len(), 2);

        runner.tick(Duration::from_millis(500));
        assert_eq!(entries(&log).len(), 4);
    }

    #[test]
    fn pause_holds_dequeue_but_not_in_flight() {
        let log = journal();
        let mut runner = manual();
        runner.enqueue(Stub::new("slow", 2, &log), 0).unwrap();
        runner.enqueue(Stub::new("next", 0, &log), 0).unwrap();
        runner.start();
        runner.pause();
        assert!(runner.is_paused());

        run_out(&mut runner);
        assert_eq!(entries(&log), vec!["slow:execute", "slow:done"]);
        assert_eq!(runner.queue_len(), 1);

        runner.resume();
        run_out(&mut runner);
        assert_eq!(runner.queue_len(), 0);
        assert!(entries(&log).contains(&"next:done".to_owned()));
    }

    #[test]
    fn stop_cancels_in_flight_and_keeps_queue() {
        let log = journal();
        let mut runner = manual();
        runner.enqueue(Stub::new("slow", 5, &log), 0).unwrap();
        runner.enqueue(Stub::new("kept", 0, &log), 0).unwrap();
        runner.start();
        runner.stop();

        assert!(!runner.is_executing());
        assert!(runner.current().is_none());
        assert_eq!(runner.queue_len(), 1);
        assert_eq!(entries(&log), vec!["slow:execute", "slow:cancel"]);
        assert_eq!(
            runner.history().last().map(|e| e.status()),
            Some(ActionStatus::Cancelled)
        );

        runner.start();
        run_out(&mut runner);
        assert!(entries(&log).contains(&"kept:done".to_owned()));
    }

    #[test]
    fn invalid_controls_change_nothing() {
        let log = journal();
        let mut runner = manual();
        runner.pause();
        runner.resume();
        runner.stop();
        runner.start();
        assert!(!runner.cancel_current());
        assert!(!runner.is_executing());
        assert!(!runner.is_paused());
        assert!(runner.drain_events().is_empty());

        let mut locked = ActionRunner::new(RunnerConfig {
            allow_cancel: false,
            ..RunnerConfig::default()
        });
        locked.enqueue(Stub::new("stuck", 3, &log), 0).unwrap();
        assert!(!locked.cancel_current());
        locked.clear_all();
        assert_eq!(locked.current().map(|e| e.name()), Some("stuck"));
    }

    #[test]
    fn clear_queue_leaves_in_flight_alone() {
        let log = journal();
        let mut runner = ActionRunner::new(RunnerConfig::default());
        runner.enqueue(Stub::new("busy", 2, &log), 0).unwrap();
        runner.enqueue(Stub::new("x", 0, &log), 0).unwrap();
        runner.enqueue(Stub::new("y", 0, &log), 0).unwrap();
        runner.drain_events();

        assert_eq!(runner.clear_queue(), 2);
        assert_eq!(
            runner.drain_events(),
            vec![ActionEvent::QueueCleared { discarded: 2 }]
        );
        assert_eq!(runner.current().map(|e| e.name()), Some("busy"));

        runner.clear_all();
        assert!(runner.current().is_none());
        assert!(entries(&log).contains(&"busy:cancel".to_owned()));
    }

    #[test]
    fn enqueue_many_counts_accepted() {
        let log = journal();
        let mut runner = ActionRunner::new(RunnerConfig {
            capacity: 2,
            auto_execute: false,
            ..RunnerConfig::default()
        });
        let batch: Vec<Box<dyn CombatAction>> = vec![
            Stub::new("a", 0, &log),
            Stub::new("b", 0, &log),
            Stub::new("c", 0, &log),
        ];
        assert_eq!(runner.enqueue_many(batch, 1), 2);
        assert_eq!(runner.queue_len(), 2);
    }

    #[test]
    fn undo_targets_latest_completed() {
        let log = journal();
        let mut runner = manual();
        runner.enqueue(Stub::undoable("u", &log), 0).unwrap();
        runner.enqueue(Stub::new("plain", 0, &log), 0).unwrap();
        runner.start();
        run_out(&mut runner);

        assert_eq!(runner.undo_last(), Err(UndoError::Unsupported));
        assert_eq!(runner.history().count(), 2);
    }

    #[test]
    fn undo_removes_entry_from_history() {
        let log = journal();
        let mut runner = manual();
        runner.enqueue(Stub::undoable("u", &log), 0).unwrap();
        runner.start();
        run_out(&mut runner);

        assert_eq!(runner.undo_last(), Ok(ActionId(0)));
        assert!(entries(&log).contains(&"u:undo".to_owned()));
        assert_eq!(runner.undo_last(), Err(UndoError::NothingToUndo));
    }

    #[test]
    fn history_is_bounded() {
        let log = journal();
        let mut runner = ActionRunner::new(RunnerConfig {
            history_len: 2,
            auto_execute: false,
            inter_action_delay_secs: 0.0,
            ..RunnerConfig::default()
        });
        for name in ["a", "b", "c"] {
            runner.enqueue(Stub::new(name, 0, &log), 0).unwrap();
        }
        runner.start();

        let kept: Vec<_> = runner.history().map(|e| e.name().to_owned()).collect();
        assert_eq!(kept, vec!["b", "c"]);
        assert!(!runner.is_executing());
    }

    #[test]
    fn timestamps_follow_runner_clock() {
        let log = journal();
        let mut runner = manual();
        runner.tick(Duration::from_secs(1));
        runner.enqueue(Stub::new("timed", 2, &log), 0).unwrap();
        runner.start();
        runner.tick(Duration::from_secs(1));
        runner.tick(Duration::from_secs(1));

        let entry = runner.history().next().unwrap();
        assert_eq!(entry.queued_at(), Timestamp(Duration::from_secs(1)));
        assert_eq!(entry.started_at(), Some(Timestamp(Duration::from_secs(1))));
        assert_eq!(entry.ended_at(), Some(Timestamp(Duration::from_secs(3))));
    }
}
