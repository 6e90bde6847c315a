//! One mutual-exclusion unit per poll.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{PollError, StoreError};
use crate::poll::PollId;

/// Serializes every capacity-affecting operation on the same poll.
///
/// Different polls never contend. The guard returned by [`PollLocks::acquire`]
/// must be held for the whole read-check-write sequence.
#[derive(Default)]
pub struct PollLocks {
    locks: DashMap<PollId, Arc<Mutex<()>>>,
}

impl PollLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `poll_id`, giving up after `timeout`.
    pub async fn acquire(
        &self,
        poll_id: PollId,
        timeout: Duration,
    ) -> Result<OwnedMutexGuard<()>, PollError> {
        // Clone the Arc out so the map shard is not locked while we wait.
        let lock = self.locks.entry(poll_id).or_default().clone();
        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                PollError::StorageUnavailable(StoreError::Unavailable(format!(
                    "poll {poll_id} is busy"
                )))
            })
    }

    /// Drop the lock entry of a closed poll.
    ///
    /// Only valid once the poll is `Closed`: a caller racing with the removal
    /// may end up on a fresh mutex, but it will still observe the closed state
    /// and reject.
    pub fn forget(&self, poll_id: PollId) {
        self.locks.remove(&poll_id);
    }

    /// Drop the entry for `poll_id` if nobody holds or waits on it.
    ///
    /// Used when the poll turned out not to exist, so unknown ids do not
    /// accumulate entries.
    pub fn release_if_idle(&self, poll_id: PollId) {
        self.locks
            .remove_if(&poll_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
