//! Polls, their options, and the votes cast against them.

mod outcome;

pub use outcome::{CastOutcome, RetractOutcome};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Store-assigned poll identifier.
    PollId
);
id_type!(
    /// Store-assigned option identifier, unique across polls.
    OptionId
);
id_type!(
    /// Caller-supplied user identifier. Trusted as-is.
    UserId
);
id_type!(
    /// The chat a poll lives in.
    ScopeId
);

/// Poll lifecycle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollState {
    Open,
    Closed,
}

impl PollState {
    pub fn is_open(self) -> bool {
        self == PollState::Open
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    pub scope: ScopeId,
    pub question: String,
    pub creator: UserId,
    pub state: PollState,
    pub created_at: DateTime<Utc>,
    /// Opaque handle of the message displaying this poll, if any.
    pub message_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: OptionId,
    pub poll_id: PollId,
    pub text: String,
    /// Maximum number of votes this option admits. Always at least 1.
    pub quota: u32,
    /// Zero-based insertion order within the poll.
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub poll_id: PollId,
    pub option_id: OptionId,
    pub user: UserId,
    /// Name of the voter at the time the vote was cast.
    pub display_name: Option<String>,
    pub cast_at: DateTime<Utc>,
}

/// Option text and quota as requested at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOption {
    pub text: String,
    pub quota: u32,
}

impl NewOption {
    pub fn new(text: impl Into<String>, quota: u32) -> Self {
        Self {
            text: text.into(),
            quota,
        }
    }
}

/// A validated poll ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPoll {
    pub scope: ScopeId,
    pub creator: UserId,
    pub question: String,
    pub options: Vec<NewOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub poll_id: PollId,
    pub option_id: OptionId,
    pub user: UserId,
    pub display_name: Option<String>,
}

/// Poll, options and votes read together from the store.
///
/// Options are in insertion order, votes oldest first.
#[derive(Debug, Clone)]
pub struct PollSnapshot {
    pub poll: Poll,
    pub options: Vec<PollOption>,
    pub votes: Vec<Vote>,
}

/// Per-option standing of a poll.
#[derive(Debug, Clone, Serialize)]
pub struct OptionTally {
    pub option: PollOption,
    pub count: u32,
    /// Voter names, oldest vote first.
    pub voters: Vec<Option<String>>,
}

impl OptionTally {
    pub fn remaining(&self) -> u32 {
        self.option.quota.saturating_sub(self.count)
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.option.quota
    }
}

/// The current result of a poll, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Tally {
    pub poll: Poll,
    pub options: Vec<OptionTally>,
}

impl Tally {
    pub fn total_votes(&self) -> u32 {
        self.options.iter().map(|o| o.count).sum()
    }
}

impl From<PollSnapshot> for Tally {
    fn from(snapshot: PollSnapshot) -> Self {
        let options = snapshot
            .options
            .into_iter()
            .map(|option| {
                let voters: Vec<Option<String>> = snapshot
                    .votes
                    .iter()
                    .filter(|v| v.option_id == option.id)
                    .map(|v| v.display_name.clone())
                    .collect();
                OptionTally {
                    count: voters.len() as u32,
                    option,
                    voters,
                }
            })
            .collect();
        Tally {
            poll: snapshot.poll,
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll() -> Poll {
        Poll {
            id: PollId(1),
            scope: ScopeId(10),
            question: "Lunch".to_string(),
            creator: UserId(7),
            state: PollState::Open,
            created_at: Utc::now(),
            message_ref: None,
        }
    }

    fn option(id: i64, text: &str, quota: u32, position: u32) -> PollOption {
        PollOption {
            id: OptionId(id),
            poll_id: PollId(1),
            text: text.to_string(),
            quota,
            position,
        }
    }

    fn vote(option: i64, user: i64, name: Option<&str>) -> Vote {
        Vote {
            poll_id: PollId(1),
            option_id: OptionId(option),
            user: UserId(user),
            display_name: name.map(str::to_string),
            cast_at: Utc::now(),
        }
    }

    #[test]
    fn tally_groups_votes_in_order() {
        let tally = Tally::from(PollSnapshot {
            poll: poll(),
            options: vec![option(1, "Pizza", 2, 0), option(2, "Salad", 1, 1)],
            votes: vec![
                vote(1, 1, Some("ann")),
                vote(2, 4, Some("dan")),
                vote(1, 2, None),
            ],
        });

        assert_eq!(tally.options.len(), 2);
        assert_eq!(tally.options[0].option.text, "Pizza");
        assert_eq!(tally.options[0].count, 2);
        assert_eq!(tally.options[0].voters, vec![Some("ann".to_string()), None]);
        assert!(tally.options[0].is_full());
        assert_eq!(tally.options[1].count, 1);
        assert_eq!(tally.total_votes(), 3);
    }

    #[test]
    fn remaining_never_underflows() {
        let t = OptionTally {
            option: option(1, "Pizza", 1, 0),
            count: 3,
            voters: vec![],
        };
        assert_eq!(t.remaining(), 0);
        assert!(t.is_full());
    }

    #[test]
    fn ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&PollId(42)).unwrap(), "42");
        assert_eq!(PollId(42).to_string(), "42");
    }

    #[test]
    fn state_is_open() {
        assert!(PollState::Open.is_open());
        assert!(!PollState::Closed.is_open());
    }
}
