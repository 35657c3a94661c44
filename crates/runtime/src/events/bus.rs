//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use combat_core::{ActionEvent, CombatEvent, PhaseEvent, TurnEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Turn starts and ends, queue rebuilds, completed rounds
    Turn,
    /// Phase changes and elapsed holds
    Phase,
    /// Action runner lifecycle
    Action,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Turn, Topic::Phase, Topic::Action];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Turn(TurnEvent),
    Phase(PhaseEvent),
    Action(ActionEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Turn(_) => Topic::Turn,
            Event::Phase(_) => Topic::Phase,
            Event::Action(_) => Topic::Action,
        }
    }
}

impl From<CombatEvent> for Event {
    fn from(event: CombatEvent) -> Self {
        match event {
            CombatEvent::Turn(event) => Event::Turn(event),
            CombatEvent::Phase(event) => Event::Phase(event),
            CombatEvent::Action(event) => Event::Action(event),
        }
    }
}

struct Channels {
    turn: broadcast::Sender<Event>,
    phase: broadcast::Sender<Event>,
    action: broadcast::Sender<Event>,
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Events published while a topic has no subscriber
/// are dropped.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                turn: broadcast::channel(capacity).0,
                phase: broadcast::channel(capacity).0,
                action: broadcast::channel(capacity).0,
            }),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Turn => &self.channels.turn,
            Topic::Phase => &self.channels.phase,
            Topic::Action => &self.channels.action,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!(target: "runtime::bus", "No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
