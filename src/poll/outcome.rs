use serde::Serialize;

use super::OptionId;

/// Result of a vote attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CastOutcome {
    Accepted {
        option_id: OptionId,
        option_text: String,
        count: u32,
        remaining: u32,
    },
    RejectedClosed,
    /// The user already holds a vote in this poll and must retract first.
    RejectedDuplicate,
    RejectedFull,
    RejectedUnknownOption,
}

impl CastOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CastOutcome::Accepted { .. })
    }

    pub fn message(&self) -> String {
        match self {
            CastOutcome::Accepted { option_text, .. } => format!("Voted for: {option_text}"),
            CastOutcome::RejectedClosed => "This poll is closed.".to_string(),
            CastOutcome::RejectedDuplicate => {
                "You already voted! Retract your vote first to change it.".to_string()
            }
            CastOutcome::RejectedFull => "This option is full!".to_string(),
            CastOutcome::RejectedUnknownOption => "That option is not part of this poll.".to_string(),
        }
    }
}

/// Result of a retraction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RetractOutcome {
    Retracted { option_id: OptionId },
    RejectedClosed,
    RejectedNoVote,
}

impl RetractOutcome {
    pub fn message(&self) -> String {
        match self {
            RetractOutcome::Retracted { .. } => "Vote retracted!".to_string(),
            RetractOutcome::RejectedClosed => "This poll is closed.".to_string(),
            RetractOutcome::RejectedNoVote => "You haven't voted yet!".to_string(),
        }
    }
}
