//! Change notifications for whoever displays polls.
//!
//! The engine and lifecycle emit an [`Event`] after each successful mutation,
//! once the poll's lock is released. Built on [`tokio::sync::broadcast`] so
//! several views can refresh independently.

use tokio::sync::broadcast;

use crate::poll::{OptionId, PollId, ScopeId, UserId};

/// Events that flow through the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PollCreated { poll_id: PollId, scope: ScopeId },
    VoteCast {
        poll_id: PollId,
        option_id: OptionId,
        user: UserId,
    },
    VoteRetracted {
        poll_id: PollId,
        option_id: OptionId,
        user: UserId,
    },
    PollClosed { poll_id: PollId },
}

impl Event {
    /// The poll whose display is now stale.
    pub fn poll_id(&self) -> PollId {
        match self {
            Event::PollCreated { poll_id, .. }
            | Event::VoteCast { poll_id, .. }
            | Event::VoteRetracted { poll_id, .. }
            | Event::PollClosed { poll_id } => *poll_id,
        }
    }
}

/// A broadcast channel that any component can emit to or subscribe from.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events. Returns a receiver that yields all
    /// future events (does not replay past ones).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
