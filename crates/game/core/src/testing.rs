//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::action::{ActionCategory, ActionContext, ActionPoll, CombatAction};
use crate::participant::{Controller, Participant, ParticipantId, ParticipantRef};

pub struct Dummy {
    id: ParticipantId,
    name: String,
    speed: i32,
    controller: Controller,
    alive: AtomicBool,
    pub starts: AtomicU32,
    pub ends: AtomicU32,
}

impl Dummy {
    pub fn new(id: u32, speed: i32, controller: Controller) -> Arc<Self> {
        Arc::new(Self {
            id: ParticipantId(id),
            name: format!("p{id}"),
            speed,
            controller,
            alive: AtomicBool::new(true),
            starts: AtomicU32::new(0),
            ends: AtomicU32::new(0),
        })
    }

    pub fn player(id: u32, speed: i32) -> Arc<Self> {
        Self::new(id, speed, Controller::Player)
    }

    pub fn ai(id: u32, speed: i32) -> Arc<Self> {
        Self::new(id, speed, Controller::Ai)
    }

    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn revive(&self) {
        self.alive.store(true, Ordering::SeqCst);
    }
}

impl Participant for Dummy {
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
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_turn_end(&self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn refs(dummies: &[Arc<Dummy>]) -> Vec<ParticipantRef> {
    dummies
        .iter()
        .map(|d| Arc::clone(d) as ParticipantRef)
        .collect()
}

/// Log shared between a test and the actions it enqueues.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Action that stays pending for `polls` polls after starting, recording
/// every hook in the journal.
pub struct Stub {
    name: String,
    polls: u32,
    valid: bool,
    undoable: bool,
    journal: Journal,
}

impl Stub {
    pub fn new(name: &str, polls: u32, journal: &Journal) -> Box<Self> {
        Box::new(Self {
            name: name.to_owned(),
            polls,
            valid: true,
            undoable: false,
            journal: Arc::clone(journal),
        })
    }

    pub fn invalid(name: &str, journal: &Journal) -> Box<Self> {
        let mut stub = Self::new(name, 0, journal);
        stub.valid = false;
        stub
    }

    pub fn undoable(name: &str, journal: &Journal) -> Box<Self> {
        let mut stub = Self::new(name, 0, journal);
        stub.undoable = true;
        stub
    }

    fn log(&self, hook: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, hook));
    }
}

impl CombatAction for Stub {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Attack
    }

    fn can_execute(&self) -> bool {
        self.valid
    }

    fn execute(&mut self, _ctx: &ActionContext) -> ActionPoll {
        self.log("execute");
        if self.polls == 0 {
            self.log("done");
            ActionPoll::Complete
        } else {
            ActionPoll::Pending
        }
    }

    fn poll(&mut self, _ctx: &ActionContext) -> ActionPoll {
        self.polls = self.polls.saturating_sub(1);
        if self.polls == 0 {
            self.log("done");
            ActionPoll::Complete
        } else {
            ActionPoll::Pending
        }
    }

    fn cancel(&mut self) {
        self.log("cancel");
    }

    fn undo(&mut self) -> Result<(), crate::action::UndoError> {
        if self.undoable {
            self.log("undo");
            Ok(())
        } else {
            Err(crate::action::UndoError::Unsupported)
        }
    }
}
