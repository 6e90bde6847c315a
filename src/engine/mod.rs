//! Vote admission: the only place votes are added or removed.

pub mod locks;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{PollError, StoreError};
use crate::events::{Event, EventBus};
use crate::poll::{
    CastOutcome, NewVote, OptionId, PollId, PollState, RetractOutcome, Tally, UserId,
};
use crate::store::PollStore;
use locks::PollLocks;

/// Run a store call, turning a timeout into a transient failure.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    what: &str,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, PollError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(StoreError::Unavailable(format!("{what} timed out")).into()),
    }
}

/// Decides accept/reject for every vote and retraction.
///
/// Holds no vote state of its own: each decision re-reads the store while
/// holding the poll's lock.
pub struct VoteEngine {
    store: Arc<dyn PollStore>,
    locks: Arc<PollLocks>,
    events: Arc<EventBus>,
    timeout: Duration,
}

impl VoteEngine {
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

    /// Cast `user`'s vote for `option_id`.
    ///
    /// Fails with [`PollError::NotFound`] if the poll does not exist, and with
    /// [`PollError::StorageUnavailable`] if the store cannot be reached. In
    /// both cases nothing is admitted and the call can be retried.
    pub async fn cast_vote(
        &self,
        poll_id: PollId,
        option_id: OptionId,
        user: UserId,
        display_name: Option<String>,
    ) -> Result<CastOutcome, PollError> {
        let result = {
            let _guard = self.locks.acquire(poll_id, self.timeout).await?;
            self.admit(poll_id, option_id, user, display_name).await
        };
        let outcome = self.settle(poll_id, result)?;

        debug!(poll = %poll_id, option = %option_id, user = %user, ?outcome, "vote attempt");
        if outcome.is_accepted() {
            self.events.emit(Event::VoteCast {
                poll_id,
                option_id,
                user,
            });
        }
        Ok(outcome)
    }

    /// Caller must hold the poll's lock.
    async fn admit(
        &self,
        poll_id: PollId,
        option_id: OptionId,
        user: UserId,
        display_name: Option<String>,
    ) -> Result<CastOutcome, PollError> {
        let poll = bounded(self.timeout, "load poll", self.store.poll(poll_id))
            .await?
            .ok_or(PollError::NotFound(poll_id))?;
        if poll.state == PollState::Closed {
            return Ok(CastOutcome::RejectedClosed);
        }

        let existing = bounded(self.timeout, "load vote", self.store.vote(poll_id, user)).await?;
        if existing.is_some() {
            return Ok(CastOutcome::RejectedDuplicate);
        }

        let option = match bounded(self.timeout, "load option", self.store.option(option_id))
            .await?
        {
            Some(option) if option.poll_id == poll_id => option,
            _ => return Ok(CastOutcome::RejectedUnknownOption),
        };

        let count = bounded(
            self.timeout,
            "count votes",
            self.store.count_votes(option.id),
        )
        .await?;
        if count >= option.quota {
            return Ok(CastOutcome::RejectedFull);
        }

        let vote = NewVote {
            poll_id,
            option_id: option.id,
            user,
            display_name,
        };
        match bounded(self.timeout, "insert vote", self.store.insert_vote(vote)).await {
            Ok(_) => {}
            Err(PollError::StorageUnavailable(StoreError::Conflict)) => {
                warn!(poll = %poll_id, user = %user, "store refused duplicate vote that passed the engine check");
                return Ok(CastOutcome::RejectedDuplicate);
            }
            Err(e) => return Err(e),
        }

        let count = count + 1;
        Ok(CastOutcome::Accepted {
            option_id: option.id,
            option_text: option.text,
            count,
            remaining: option.quota - count,
        })
    }

    /// Withdraw `user`'s vote so they can vote again.
    pub async fn retract_vote(
        &self,
        poll_id: PollId,
        user: UserId,
    ) -> Result<RetractOutcome, PollError> {
        let result = {
            let _guard = self.locks.acquire(poll_id, self.timeout).await?;
            self.withdraw(poll_id, user).await
        };
        let outcome = self.settle(poll_id, result)?;

        debug!(poll = %poll_id, user = %user, ?outcome, "retract attempt");
        if let RetractOutcome::Retracted { option_id } = outcome {
            self.events.emit(Event::VoteRetracted {
                poll_id,
                option_id,
                user,
            });
        }
        Ok(outcome)
    }

    /// Caller must hold the poll's lock.
    async fn withdraw(&self, poll_id: PollId, user: UserId) -> Result<RetractOutcome, PollError> {
        let poll = bounded(self.timeout, "load poll", self.store.poll(poll_id))
            .await?
            .ok_or(PollError::NotFound(poll_id))?;
        if poll.state == PollState::Closed {
            return Ok(RetractOutcome::RejectedClosed);
        }

        let deleted = bounded(
            self.timeout,
            "delete vote",
            self.store.delete_vote(poll_id, user),
        )
        .await?;
        Ok(match deleted {
            Some(vote) => RetractOutcome::Retracted {
                option_id: vote.option_id,
            },
            None => RetractOutcome::RejectedNoVote,
        })
    }

    /// Unknown polls must not leave a lock entry behind.
    fn settle<T>(&self, poll_id: PollId, result: Result<T, PollError>) -> Result<T, PollError> {
        if let Err(PollError::NotFound(_)) = &result {
            self.locks.release_if_idle(poll_id);
        }
        result
    }

    /// Current standing of every option, in creation order.
    ///
    /// Reads one store snapshot and does not take the poll's lock.
    pub async fn tally(&self, poll_id: PollId) -> Result<Tally, PollError> {
        let snapshot = bounded(self.timeout, "load snapshot", self.store.snapshot(poll_id))
            .await?
            .ok_or(PollError::NotFound(poll_id))?;
        Ok(Tally::from(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::{NewOption, NewPoll, ScopeId};
    use crate::store::memory::InMemoryPollStore;

    const TIMEOUT: Duration = Duration::from_secs(1);

    async fn setup() -> (VoteEngine, Arc<dyn PollStore>, PollId, Vec<OptionId>) {
        let store: Arc<dyn PollStore> = Arc::new(InMemoryPollStore::new());
        let poll_id = store
            .insert_poll(NewPoll {
                scope: ScopeId(1),
                creator: UserId(100),
                question: "Lunch".to_string(),
                options: vec![NewOption::new("Pizza", 2), NewOption::new("Salad", 1)],
            })
            .await
            .unwrap();
        let options = store
            .options(poll_id)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        let engine = VoteEngine::new(
            Arc::clone(&store),
            Arc::new(PollLocks::new()),
            Arc::new(EventBus::default()),
            TIMEOUT,
        );
        (engine, store, poll_id, options)
    }

    #[tokio::test]
    async fn accepted_reports_count_and_remaining() {
        let (engine, _, poll, opts) = setup().await;
        let outcome = engine
            .cast_vote(poll, opts[0], UserId(1), Some("ann".to_string()))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CastOutcome::Accepted {
                option_id: opts[0],
                option_text: "Pizza".to_string(),
                count: 1,
                remaining: 1,
            }
        );
    }

    #[tokio::test]
    async fn option_from_other_poll_is_unknown() {
        let (engine, store, poll, _) = setup().await;
        let other = store
            .insert_poll(NewPoll {
                scope: ScopeId(2),
                creator: UserId(100),
                question: "Dinner".to_string(),
                options: vec![NewOption::new("Soup", 1), NewOption::new("Stew", 1)],
            })
            .await
            .unwrap();
        let foreign = store.options(other).await.unwrap()[0].id;

        let outcome = engine.cast_vote(poll, foreign, UserId(1), None).await.unwrap();
        assert_eq!(outcome, CastOutcome::RejectedUnknownOption);
        assert_eq!(store.count_votes(foreign).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_option_is_unknown() {
        let (engine, _, poll, _) = setup().await;
        let outcome = engine
            .cast_vote(poll, OptionId(999), UserId(1), None)
            .await
            .unwrap();
        assert_eq!(outcome, CastOutcome::RejectedUnknownOption);
    }

    #[tokio::test]
    async fn missing_poll_is_not_found() {
        let (engine, _, _, opts) = setup().await;
        let err = engine
            .cast_vote(PollId(999), opts[0], UserId(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::NotFound(PollId(999))));
    }

    #[tokio::test]
    async fn unknown_polls_leave_no_lock_entries() {
        let (engine, _, poll, opts) = setup().await;
        for id in 1_000..1_200 {
            let cast = engine.cast_vote(PollId(id), opts[0], UserId(1), None).await;
            assert!(matches!(cast, Err(PollError::NotFound(_))));
            let retract = engine.retract_vote(PollId(id), UserId(1)).await;
            assert!(matches!(retract, Err(PollError::NotFound(_))));
        }
        assert!(engine.locks.is_empty());

        engine.cast_vote(poll, opts[0], UserId(1), None).await.unwrap();
        assert_eq!(engine.locks.len(), 1, "live poll keeps its entry");
    }

    #[tokio::test]
    async fn retract_without_vote() {
        let (engine, _, poll, _) = setup().await;
        assert_eq!(
            engine.retract_vote(poll, UserId(1)).await.unwrap(),
            RetractOutcome::RejectedNoVote
        );
    }

    #[tokio::test]
    async fn accepted_vote_emits_event() {
        let (engine, _, poll, opts) = setup().await;
        let mut rx = engine.events.subscribe();

        engine.cast_vote(poll, opts[1], UserId(4), None).await.unwrap();
        // Rejected attempts are silent.
        engine.cast_vote(poll, opts[1], UserId(5), None).await.unwrap();

        match rx.recv().await.unwrap() {
            Event::VoteCast { user, option_id, .. } => {
                assert_eq!(user, UserId(4));
                assert_eq!(option_id, opts[1]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn busy_poll_times_out_as_transient() {
        let store: Arc<dyn PollStore> = Arc::new(InMemoryPollStore::new());
        let locks = Arc::new(PollLocks::new());
        let engine = VoteEngine::new(
            store,
            Arc::clone(&locks),
            Arc::new(EventBus::default()),
            Duration::from_millis(20),
        );
        let _held = locks.acquire(PollId(1), TIMEOUT).await.unwrap();

        let err = engine
            .cast_vote(PollId(1), OptionId(1), UserId(1), None)
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
