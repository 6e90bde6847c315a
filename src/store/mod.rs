pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::poll::{
    NewPoll, NewVote, OptionId, Poll, PollId, PollOption, PollSnapshot, ScopeId, UserId, Vote,
};

/// Durable home of polls, options and votes. Could be SQLite, in-memory, etc.
///
/// Each call must be atomic on its own. Cross-call consistency is the
/// engine's job: it serializes mutations per poll before touching the store.
/// Implementations must still refuse a second vote for the same
/// (poll, user) pair with [`StoreError::Conflict`].
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Persist a poll together with all of its options, or nothing at all.
    async fn insert_poll(&self, poll: NewPoll) -> Result<PollId, StoreError>;

    async fn poll(&self, id: PollId) -> Result<Option<Poll>, StoreError>;

    /// Most recently created open poll in the scope.
    async fn latest_open_poll(&self, scope: ScopeId) -> Result<Option<Poll>, StoreError>;

    async fn set_message_ref(&self, id: PollId, message_ref: &str) -> Result<(), StoreError>;

    async fn close_poll(&self, id: PollId) -> Result<(), StoreError>;

    /// Options in insertion order.
    async fn options(&self, poll_id: PollId) -> Result<Vec<PollOption>, StoreError>;

    async fn option(&self, id: OptionId) -> Result<Option<PollOption>, StoreError>;

    async fn vote(&self, poll_id: PollId, user: UserId) -> Result<Option<Vote>, StoreError>;

    async fn count_votes(&self, option_id: OptionId) -> Result<u32, StoreError>;

    async fn insert_vote(&self, vote: NewVote) -> Result<Vote, StoreError>;

    /// Remove the user's vote. Returns the removed vote, if there was one.
    async fn delete_vote(&self, poll_id: PollId, user: UserId) -> Result<Option<Vote>, StoreError>;

    /// Poll, options and votes as of a single instant.
    async fn snapshot(&self, poll_id: PollId) -> Result<Option<PollSnapshot>, StoreError>;
}
