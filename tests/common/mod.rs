#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use quotapoll::config::EngineConfig;
use quotapoll::error::StoreError;
use quotapoll::poll::{
    NewOption, NewPoll, NewVote, OptionId, Poll, PollId, PollOption, PollSnapshot, ScopeId, UserId,
    Vote,
};
use quotapoll::service::PollService;
use quotapoll::store::PollStore;
use quotapoll::store::memory::InMemoryPollStore;
use quotapoll::store::sqlite::SqlitePollStore;

pub const CHAT: ScopeId = ScopeId(10);
pub const CREATOR: UserId = UserId(100);

/// Both store implementations, labelled for assertion messages.
pub fn stores() -> Vec<(&'static str, Arc<dyn PollStore>)> {
    let memory: Arc<dyn PollStore> = Arc::new(InMemoryPollStore::new());
    let sqlite: Arc<dyn PollStore> = Arc::new(SqlitePollStore::in_memory().unwrap());
    vec![("memory", memory), ("sqlite", sqlite)]
}

pub fn service(store: Arc<dyn PollStore>) -> Arc<PollService> {
    Arc::new(PollService::new(store, &EngineConfig::default()))
}

pub fn options(specs: &[(&str, u32)]) -> Vec<NewOption> {
    specs.iter().map(|(t, q)| NewOption::new(*t, *q)).collect()
}

/// Create a poll in `CHAT` by `CREATOR` and return its id and option ids.
pub async fn create(service: &PollService, specs: &[(&str, u32)]) -> (PollId, Vec<OptionId>) {
    let poll_id = service
        .polls()
        .create_poll(CHAT, CREATOR, "Lunch", options(specs))
        .await
        .unwrap();
    let tally = service.votes().tally(poll_id).await.unwrap();
    let ids = tally.options.iter().map(|o| o.option.id).collect();
    (poll_id, ids)
}

/// Wraps a real store and misbehaves on demand.
#[derive(Default)]
pub struct FaultyStore {
    inner: InMemoryPollStore,
    /// `insert_vote` fails as if the backend went away.
    pub fail_inserts: AtomicBool,
    /// `vote` pretends nobody has voted, so only the unique rule can catch duplicates.
    pub hide_votes: AtomicBool,
    /// `poll` stalls for this long before answering.
    pub stall: Option<Duration>,
}

impl FaultyStore {
    pub fn stalling(stall: Duration) -> Self {
        Self {
            stall: Some(stall),
            ..Self::default()
        }
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl PollStore for FaultyStore {
    async fn insert_poll(&self, poll: NewPoll) -> Result<PollId, StoreError> {
        self.inner.insert_poll(poll).await
    }

    async fn poll(&self, id: PollId) -> Result<Option<Poll>, StoreError> {
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        self.inner.poll(id).await
    }

    async fn latest_open_poll(&self, scope: ScopeId) -> Result<Option<Poll>, StoreError> {
        self.inner.latest_open_poll(scope).await
    }

    async fn set_message_ref(&self, id: PollId, message_ref: &str) -> Result<(), StoreError> {
        self.inner.set_message_ref(id, message_ref).await
    }

    async fn close_poll(&self, id: PollId) -> Result<(), StoreError> {
        self.inner.close_poll(id).await
    }

    async fn options(&self, poll_id: PollId) -> Result<Vec<PollOption>, StoreError> {
        self.inner.options(poll_id).await
    }

    async fn option(&self, id: OptionId) -> Result<Option<PollOption>, StoreError> {
        self.inner.option(id).await
    }

    async fn vote(&self, poll_id: PollId, user: UserId) -> Result<Option<Vote>, StoreError> {
        if self.hide_votes.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.vote(poll_id, user).await
    }

    async fn count_votes(&self, option_id: OptionId) -> Result<u32, StoreError> {
        self.inner.count_votes(option_id).await
    }

    async fn insert_vote(&self, vote: NewVote) -> Result<Vote, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk on fire".to_string()));
        }
        self.inner.insert_vote(vote).await
    }

    async fn delete_vote(&self, poll_id: PollId, user: UserId) -> Result<Option<Vote>, StoreError> {
        self.inner.delete_vote(poll_id, user).await
    }

    async fn snapshot(&self, poll_id: PollId) -> Result<Option<PollSnapshot>, StoreError> {
        self.inner.snapshot(poll_id).await
    }
}
