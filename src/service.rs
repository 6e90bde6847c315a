//! Wires the engine and the lifecycle manager over one store.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::EngineConfig;
use crate::engine::VoteEngine;
use crate::engine::locks::PollLocks;
use crate::events::{Event, EventBus};
use crate::lifecycle::PollLifecycle;
use crate::store::PollStore;

/// Everything a front end needs to run polls.
///
/// The engine and the lifecycle share one lock table, so closing a poll and
/// voting on it are serialized against each other.
pub struct PollService {
    engine: VoteEngine,
    lifecycle: PollLifecycle,
    events: Arc<EventBus>,
}

impl PollService {
    pub fn new(store: Arc<dyn PollStore>, config: &EngineConfig) -> Self {
        let locks = Arc::new(PollLocks::new());
        let events = Arc::new(EventBus::default());
        Self {
            engine: VoteEngine::new(
                Arc::clone(&store),
                Arc::clone(&locks),
                Arc::clone(&events),
                config.op_timeout,
            ),
            lifecycle: PollLifecycle::new(store, locks, Arc::clone(&events), config.op_timeout),
            events,
        }
    }

    /// Cast, retract, tally.
    pub fn votes(&self) -> &VoteEngine {
        &self.engine
    }

    /// Create, close, find the active poll.
    pub fn polls(&self) -> &PollLifecycle {
        &self.lifecycle
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}
