use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::PollStore;
use crate::error::StoreError;
use crate::poll::{
    NewPoll, NewVote, OptionId, Poll, PollId, PollOption, PollSnapshot, PollState, ScopeId, UserId,
    Vote,
};

#[derive(Default)]
struct Tables {
    next_poll_id: i64,
    next_option_id: i64,
    polls: Vec<Poll>,
    options: Vec<PollOption>,
    /// Keyed by (poll, user), which is the uniqueness rule for votes.
    votes: HashMap<(PollId, UserId), (u64, Vote)>,
    next_vote_seq: u64,
}

/// Ephemeral poll store. Everything lives behind one lock, so every call
/// sees a consistent view.
#[derive(Default)]
pub struct InMemoryPollStore {
    tables: RwLock<Tables>,
}

impl InMemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("tables lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("tables lock poisoned".to_string()))
    }
}

impl Tables {
    fn poll(&self, id: PollId) -> Option<&Poll> {
        self.polls.iter().find(|p| p.id == id)
    }

    fn poll_mut(&mut self, id: PollId) -> Option<&mut Poll> {
        self.polls.iter_mut().find(|p| p.id == id)
    }

    fn options(&self, poll_id: PollId) -> Vec<PollOption> {
        let mut options: Vec<PollOption> = self
            .options
            .iter()
            .filter(|o| o.poll_id == poll_id)
            .cloned()
            .collect();
        options.sort_by_key(|o| o.position);
        options
    }
}

#[async_trait]
impl PollStore for InMemoryPollStore {
    async fn insert_poll(&self, poll: NewPoll) -> Result<PollId, StoreError> {
        let mut tables = self.write()?;
        tables.next_poll_id += 1;
        let id = PollId(tables.next_poll_id);
        tables.polls.push(Poll {
            id,
            scope: poll.scope,
            question: poll.question,
            creator: poll.creator,
            state: PollState::Open,
            created_at: Utc::now(),
            message_ref: None,
        });
        for (position, option) in poll.options.into_iter().enumerate() {
            tables.next_option_id += 1;
            let option_id = OptionId(tables.next_option_id);
            tables.options.push(PollOption {
                id: option_id,
                poll_id: id,
                text: option.text,
                quota: option.quota,
                position: position as u32,
            });
        }
        Ok(id)
    }

    async fn poll(&self, id: PollId) -> Result<Option<Poll>, StoreError> {
        Ok(self.read()?.poll(id).cloned())
    }

    async fn latest_open_poll(&self, scope: ScopeId) -> Result<Option<Poll>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .polls
            .iter()
            .filter(|p| p.scope == scope && p.state.is_open())
            .max_by_key(|p| p.id)
            .cloned())
    }

    async fn set_message_ref(&self, id: PollId, message_ref: &str) -> Result<(), StoreError> {
        if let Some(poll) = self.write()?.poll_mut(id) {
            poll.message_ref = Some(message_ref.to_string());
        }
        Ok(())
    }

    async fn close_poll(&self, id: PollId) -> Result<(), StoreError> {
        if let Some(poll) = self.write()?.poll_mut(id) {
            poll.state = PollState::Closed;
        }
        Ok(())
    }

    async fn options(&self, poll_id: PollId) -> Result<Vec<PollOption>, StoreError> {
        Ok(self.read()?.options(poll_id))
    }

    async fn option(&self, id: OptionId) -> Result<Option<PollOption>, StoreError> {
        Ok(self.read()?.options.iter().find(|o| o.id == id).cloned())
    }

    async fn vote(&self, poll_id: PollId, user: UserId) -> Result<Option<Vote>, StoreError> {
        Ok(self
            .read()?
            .votes
            .get(&(poll_id, user))
            .map(|(_, v)| v.clone()))
    }

    async fn count_votes(&self, option_id: OptionId) -> Result<u32, StoreError> {
        Ok(self
            .read()?
            .votes
            .values()
            .filter(|(_, v)| v.option_id == option_id)
            .count() as u32)
    }

    async fn insert_vote(&self, vote: NewVote) -> Result<Vote, StoreError> {
        let mut tables = self.write()?;
        let key = (vote.poll_id, vote.user);
        if tables.votes.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        let stored = Vote {
            poll_id: vote.poll_id,
            option_id: vote.option_id,
            user: vote.user,
            display_name: vote.display_name,
            cast_at: Utc::now(),
        };
        tables.next_vote_seq += 1;
        let seq = tables.next_vote_seq;
        tables.votes.insert(key, (seq, stored.clone()));
        Ok(stored)
    }

    async fn delete_vote(&self, poll_id: PollId, user: UserId) -> Result<Option<Vote>, StoreError> {
        Ok(self
            .write()?
            .votes
            .remove(&(poll_id, user))
            .map(|(_, v)| v))
    }

    async fn snapshot(&self, poll_id: PollId) -> Result<Option<PollSnapshot>, StoreError> {
        let tables = self.read()?;
        let Some(poll) = tables.poll(poll_id).cloned() else {
            return Ok(None);
        };
        let mut votes: Vec<(u64, Vote)> = tables
            .votes
            .values()
            .filter(|(_, v)| v.poll_id == poll_id)
            .cloned()
            .collect();
        votes.sort_by_key(|(seq, _)| *seq);
        Ok(Some(PollSnapshot {
            poll,
            options: tables.options(poll_id),
            votes: votes.into_iter().map(|(_, v)| v).collect(),
        }))
    }
}
