//! Error types for the poll engine and its store.

use thiserror::Error;

use crate::poll::PollId;

/// Failures reported by a [`PollStore`](crate::store::PollStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A vote for this (poll, user) pair already exists.
    #[error("conflicting vote already stored for this user")]
    Conflict,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Backend cannot serve the request right now (poisoned lock, timeout, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to whoever drives the engine.
///
/// Every variant is recoverable. Vote rejections are not errors, they are
/// outcomes (see [`CastOutcome`](crate::poll::CastOutcome)).
#[derive(Debug, Error)]
pub enum PollError {
    /// No poll with this id.
    #[error("poll {0} not found")]
    NotFound(PollId),

    /// Not found, looked up by chat: the chat has no open poll. Kept apart
    /// from [`PollError::NotFound`] so the chat can word it differently;
    /// [`PollError::is_not_found`] covers both.
    #[error("no open poll in this chat")]
    NoActivePoll,

    #[error("only the poll creator can close it")]
    Unauthorized,

    #[error("poll {0} is already closed")]
    AlreadyClosed(PollId),

    #[error("invalid poll: {0}")]
    ValidationFailed(String),

    #[error("storage failure: {0}")]
    StorageUnavailable(#[from] StoreError),
}

impl PollError {
    /// Text shown to the user in the chat.
    pub fn message(&self) -> String {
        match self {
            PollError::NotFound(_) => "This poll no longer exists.".to_string(),
            PollError::NoActivePoll => "No active poll in this chat.".to_string(),
            PollError::Unauthorized => "Only the poll creator can close it.".to_string(),
            PollError::AlreadyClosed(_) => "This poll is already closed.".to_string(),
            PollError::ValidationFailed(reason) => format!("⚠️ {reason}"),
            PollError::StorageUnavailable(_) => {
                "Something went wrong saving that. Please try again.".to_string()
            }
        }
    }

    /// Whether the poll being asked about does not exist (by id or by chat).
    pub fn is_not_found(&self) -> bool {
        matches!(self, PollError::NotFound(_) | PollError::NoActivePoll)
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PollError::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_distinct() {
        let errors = [
            PollError::NotFound(PollId(1)),
            PollError::NoActivePoll,
            PollError::Unauthorized,
            PollError::AlreadyClosed(PollId(1)),
            PollError::ValidationFailed("x".to_string()),
            PollError::StorageUnavailable(StoreError::Conflict),
        ];
        let mut seen = Vec::new();
        for e in &errors {
            let msg = e.message();
            assert!(!seen.contains(&msg), "duplicate message: {msg}");
            seen.push(msg);
        }
    }

    #[test]
    fn only_storage_errors_are_transient() {
        assert!(PollError::StorageUnavailable(StoreError::Unavailable("down".into())).is_transient());
        assert!(!PollError::Unauthorized.is_transient());
        assert!(!PollError::NoActivePoll.is_transient());
    }

    #[test]
    fn missing_poll_by_id_or_chat_is_not_found() {
        assert!(PollError::NotFound(PollId(1)).is_not_found());
        assert!(PollError::NoActivePoll.is_not_found());
        assert!(!PollError::AlreadyClosed(PollId(1)).is_not_found());
        assert!(!PollError::Unauthorized.is_not_found());
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::Unavailable("timed out".to_string());
        assert_eq!(err.to_string(), "store unavailable: timed out");
    }
}
