//! Poll creation, closing, and lookup of a chat's current poll.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::consts::MIN_OPTIONS;
use crate::engine::bounded;
use crate::engine::locks::PollLocks;
use crate::error::PollError;
use crate::events::{Event, EventBus};
use crate::poll::{NewOption, NewPoll, Poll, PollId, PollState, ScopeId, UserId};
use crate::store::PollStore;

/// Check creation input and normalize whitespace.
///
/// Rejects the whole poll if anything is wrong; there is no partial creation.
pub fn validate(
    scope: ScopeId,
    creator: UserId,
    question: &str,
    options: Vec<NewOption>,
) -> Result<NewPoll, PollError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(PollError::ValidationFailed(
            "The poll question cannot be empty.".to_string(),
        ));
    }
    if options.len() < MIN_OPTIONS {
        return Err(PollError::ValidationFailed(format!(
            "You need at least {MIN_OPTIONS} options."
        )));
    }

    let mut normalized = Vec::with_capacity(options.len());
    for option in options {
        let text = option.text.trim();
        if text.is_empty() {
            return Err(PollError::ValidationFailed(
                "Option text cannot be empty.".to_string(),
            ));
        }
        if option.quota == 0 {
            return Err(PollError::ValidationFailed(format!(
                "Limit must be at least 1 (\"{text}\")."
            )));
        }
        normalized.push(NewOption::new(text, option.quota));
    }

    Ok(NewPoll {
        scope,
        creator,
        question: question.to_string(),
        options: normalized,
    })
}

/// Opens and closes polls.
pub struct PollLifecycle {
    store: Arc<dyn PollStore>,
    locks: Arc<PollLocks>,
    events: Arc<EventBus>,
    timeout: Duration,
}

impl PollLifecycle {
    pub fn new(
        store: Arc<dyn PollStore>,
        locks: Arc<PollLocks>,
        events: Arc<EventBus>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            locks,
            events,
            timeout,
        }
    }

    /// Create an open poll with its options in one step.
    pub async fn create_poll(
        &self,
        scope: ScopeId,
        creator: UserId,
        question: &str,
        options: Vec<NewOption>,
    ) -> Result<PollId, PollError> {
        let poll = validate(scope, creator, question, options)?;
        let option_count = poll.options.len();
        let poll_id = bounded(self.timeout, "insert poll", self.store.insert_poll(poll)).await?;

        info!(poll = %poll_id, scope = %scope, creator = %creator, options = option_count, "poll created");
        self.events.emit(Event::PollCreated { poll_id, scope });
        Ok(poll_id)
    }

    /// Remember where the poll is displayed.
    ///
    /// Best effort: a failure here never undoes the poll. Callers usually log
    /// the error and move on.
    pub async fn attach_message_ref(
        &self,
        poll_id: PollId,
        message_ref: &str,
    ) -> Result<(), PollError> {
        let result: Result<(), PollError> = async {
            bounded(self.timeout, "load poll", self.store.poll(poll_id))
                .await?
                .ok_or(PollError::NotFound(poll_id))?;
            bounded(
                self.timeout,
                "set message ref",
                self.store.set_message_ref(poll_id, message_ref),
            )
            .await
        }
        .await;

        if let Err(e) = &result {
            warn!(poll = %poll_id, error = %e, "could not attach message reference");
        }
        result
    }

    /// Close a poll on behalf of `requester`, who must be its creator.
    ///
    /// Returns the poll as it is after closing.
    pub async fn close_poll(&self, poll_id: PollId, requester: UserId) -> Result<Poll, PollError> {
        let poll = {
            let _guard = self.locks.acquire(poll_id, self.timeout).await?;
            let mut poll = bounded(self.timeout, "load poll", self.store.poll(poll_id))
                .await?
                .ok_or(PollError::NotFound(poll_id))?;
            if poll.creator != requester {
                return Err(PollError::Unauthorized);
            }
            if poll.state == PollState::Closed {
                return Err(PollError::AlreadyClosed(poll_id));
            }
            bounded(self.timeout, "close poll", self.store.close_poll(poll_id)).await?;
            poll.state = PollState::Closed;
            poll
        };
        self.locks.forget(poll_id);

        info!(poll = %poll_id, "poll closed");
        self.events.emit(Event::PollClosed { poll_id });
        Ok(poll)
    }

    /// The newest open poll in `scope`.
    pub async fn active_poll(&self, scope: ScopeId) -> Result<Poll, PollError> {
        bounded(
            self.timeout,
            "load active poll",
            self.store.latest_open_poll(scope),
        )
        .await?
        .ok_or(PollError::NoActivePoll)
    }

    /// Close whatever poll is currently active in `scope`.
    pub async fn close_active_poll(
        &self,
        scope: ScopeId,
        requester: UserId,
    ) -> Result<Poll, PollError> {
        let poll = self.active_poll(scope).await?;
        self.close_poll(poll.id, requester).await
    }
}
