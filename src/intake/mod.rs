//! Conversational poll creation.
//!
//! A user walks through `/newpoll` → question → `text | limit` lines → `/done`.
//! Drafts live in an [`IntakeSessions`] store keyed by user, separate from the
//! polls themselves, and are dropped on completion, on `/cancel`, or after
//! sitting idle for longer than the configured TTL.

mod parse;

pub use parse::parse_option;

use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;

use crate::consts::MIN_OPTIONS;
use crate::poll::{NewOption, ScopeId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeStep {
    AwaitingQuestion,
    AwaitingOptions {
        question: String,
        options: Vec<NewOption>,
    },
}

#[derive(Debug, Clone)]
struct Session {
    scope: ScopeId,
    step: IntakeStep,
    touched: Instant,
}

/// What the user's message did to their draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeReply {
    QuestionSaved,
    EmptyQuestion,
    OptionAdded {
        text: String,
        quota: u32,
        total: usize,
    },
    InvalidFormat,
    LimitTooLow,
}

impl IntakeReply {
    pub fn message(&self) -> String {
        match self {
            IntakeReply::QuestionSaved => "✅ Question saved!\n\n\
                 Now send me the poll options, one per message, in this format:\n\
                 Option text | limit\n\n\
                 Example: Pizza | 5\n\n\
                 When done, send /done to create the poll."
                .to_string(),
            IntakeReply::EmptyQuestion => {
                "⚠️ The question cannot be empty. Please send the poll question.".to_string()
            }
            IntakeReply::OptionAdded { text, quota, total } => format!(
                "✅ Added: \"{text}\" (limit: {quota})\n\n\
                 Options so far: {total}\n\n\
                 Send another option or /done to finish."
            ),
            IntakeReply::InvalidFormat => {
                "⚠️ Invalid format. Please use:\nOption text | limit\n\nExample: Pizza | 5"
                    .to_string()
            }
            IntakeReply::LimitTooLow => "⚠️ Limit must be at least 1".to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("no poll in progress")]
    NoSession,
    #[error("need at least {MIN_OPTIONS} options, have {have}")]
    TooFewOptions { have: usize },
}

impl IntakeError {
    pub fn message(&self) -> String {
        match self {
            IntakeError::NoSession => "No poll in progress. Use /newpoll to start.".to_string(),
            IntakeError::TooFewOptions { .. } => format!(
                "⚠️ You need at least {MIN_OPTIONS} options. Keep adding or /cancel to abort."
            ),
        }
    }
}

/// A finished draft, ready for `create_poll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDraft {
    pub scope: ScopeId,
    pub question: String,
    pub options: Vec<NewOption>,
}

/// In-progress poll drafts, one per user.
pub struct IntakeSessions {
    sessions: DashMap<UserId, Session>,
    ttl: Duration,
}

impl IntakeSessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Start a draft for `user` in `scope`, discarding any previous one.
    pub fn begin(&self, user: UserId, scope: ScopeId) {
        self.sessions.insert(
            user,
            Session {
                scope,
                step: IntakeStep::AwaitingQuestion,
                touched: Instant::now(),
            },
        );
    }

    /// Feed a chat message into the user's draft.
    ///
    /// Returns `None` when the user has no draft or the text is a command.
    pub fn feed(&self, user: UserId, text: &str) -> Option<IntakeReply> {
        if text.starts_with('/') {
            return None;
        }
        self.expire(user);
        let mut guard = self.sessions.get_mut(&user)?;
        let session: &mut Session = &mut guard;

        let reply = match session.step {
            IntakeStep::AwaitingQuestion => {
                let question = text.trim();
                if question.is_empty() {
                    return Some(IntakeReply::EmptyQuestion);
                }
                session.step = IntakeStep::AwaitingOptions {
                    question: question.to_string(),
                    options: Vec::new(),
                };
                IntakeReply::QuestionSaved
            }
            IntakeStep::AwaitingOptions {
                ref mut options, ..
            } => match parse_option(text) {
                Ok(option) => {
                    let reply = IntakeReply::OptionAdded {
                        text: option.text.clone(),
                        quota: option.quota,
                        total: options.len() + 1,
                    };
                    options.push(option);
                    reply
                }
                Err(rejection) => rejection,
            },
        };
        session.touched = Instant::now();
        Some(reply)
    }

    /// Complete the user's draft.
    ///
    /// With too few options the draft is kept so the user can keep adding.
    pub fn finish(&self, user: UserId) -> Result<PollDraft, IntakeError> {
        self.expire(user);
        let Entry::Occupied(entry) = self.sessions.entry(user) else {
            return Err(IntakeError::NoSession);
        };
        match &entry.get().step {
            IntakeStep::AwaitingQuestion => return Err(IntakeError::NoSession),
            IntakeStep::AwaitingOptions { options, .. } if options.len() < MIN_OPTIONS => {
                return Err(IntakeError::TooFewOptions {
                    have: options.len(),
                });
            }
            IntakeStep::AwaitingOptions { .. } => {}
        }

        let session = entry.remove();
        match session.step {
            IntakeStep::AwaitingOptions { question, options } => Ok(PollDraft {
                scope: session.scope,
                question,
                options,
            }),
            IntakeStep::AwaitingQuestion => Err(IntakeError::NoSession),
        }
    }

    /// Drop the user's draft. Returns whether there was one.
    pub fn cancel(&self, user: UserId) -> bool {
        self.sessions.remove(&user).is_some()
    }

    /// Current step of the user's draft, if it is still alive.
    pub fn step(&self, user: UserId) -> Option<IntakeStep> {
        self.expire(user);
        self.sessions.get(&user).map(|s| s.step.clone())
    }

    /// Drop every expired draft. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.touched.elapsed() < self.ttl);
        before - self.sessions.len()
    }

    fn expire(&self, user: UserId) {
        self.sessions
            .remove_if(&user, |_, s| s.touched.elapsed() >= self.ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);
    const ANN: UserId = UserId(1);
    const CHAT: ScopeId = ScopeId(10);

    fn with_question() -> IntakeSessions {
        let sessions = IntakeSessions::new(HOUR);
        sessions.begin(ANN, CHAT);
        assert_eq!(sessions.feed(ANN, "Lunch?"), Some(IntakeReply::QuestionSaved));
        sessions
    }

    #[test]
    fn full_flow_produces_draft() {
        let sessions = with_question();
        assert!(matches!(
            sessions.feed(ANN, "Pizza | 2"),
            Some(IntakeReply::OptionAdded { total: 1, .. })
        ));
        sessions.feed(ANN, "Salad | 1");

        let draft = sessions.finish(ANN).unwrap();
        assert_eq!(draft.scope, CHAT);
        assert_eq!(draft.question, "Lunch?");
        assert_eq!(
            draft.options,
            vec![NewOption::new("Pizza", 2), NewOption::new("Salad", 1)]
        );
        assert!(sessions.step(ANN).is_none());
    }

    #[test]
    fn no_session_ignores_text() {
        let sessions = IntakeSessions::new(HOUR);
        assert_eq!(sessions.feed(ANN, "hello"), None);
        assert_eq!(sessions.finish(ANN), Err(IntakeError::NoSession));
    }

    #[test]
    fn commands_are_not_consumed() {
        let sessions = IntakeSessions::new(HOUR);
        sessions.begin(ANN, CHAT);
        assert_eq!(sessions.feed(ANN, "/done"), None);
        assert_eq!(sessions.step(ANN), Some(IntakeStep::AwaitingQuestion));
    }

    #[test]
    fn blank_question_is_answered() {
        let sessions = IntakeSessions::new(HOUR);
        sessions.begin(ANN, CHAT);
        assert_eq!(sessions.feed(ANN, "   "), Some(IntakeReply::EmptyQuestion));
        assert_eq!(sessions.step(ANN), Some(IntakeStep::AwaitingQuestion));
        assert_eq!(sessions.feed(ANN, "Lunch?"), Some(IntakeReply::QuestionSaved));
    }

    #[test]
    fn finish_before_question_is_no_session() {
        let sessions = IntakeSessions::new(HOUR);
        sessions.begin(ANN, CHAT);
        assert_eq!(sessions.finish(ANN), Err(IntakeError::NoSession));
    }

    #[test]
    fn too_few_options_keeps_draft() {
        let sessions = with_question();
        sessions.feed(ANN, "Pizza | 2");
        assert_eq!(
            sessions.finish(ANN),
            Err(IntakeError::TooFewOptions { have: 1 })
        );
        sessions.feed(ANN, "Salad | 1");
        assert!(sessions.finish(ANN).is_ok());
    }

    #[test]
    fn bad_lines_keep_draft() {
        let sessions = with_question();
        assert_eq!(sessions.feed(ANN, "Pizza"), Some(IntakeReply::InvalidFormat));
        assert_eq!(sessions.feed(ANN, "Pizza | 0"), Some(IntakeReply::LimitTooLow));
        assert!(matches!(
            sessions.step(ANN),
            Some(IntakeStep::AwaitingOptions { options, .. }) if options.is_empty()
        ));
    }

    #[test]
    fn cancel_drops_draft() {
        let sessions = with_question();
        assert!(sessions.cancel(ANN));
        assert!(!sessions.cancel(ANN));
        assert_eq!(sessions.feed(ANN, "Pizza | 2"), None);
    }

    #[test]
    fn sessions_are_per_user() {
        let sessions = with_question();
        let bob = UserId(2);
        assert_eq!(sessions.feed(bob, "Pizza | 2"), None);
        sessions.begin(bob, ScopeId(20));
        assert_eq!(sessions.step(ANN).map(|s| matches!(s, IntakeStep::AwaitingOptions { .. })), Some(true));
        assert_eq!(sessions.step(bob), Some(IntakeStep::AwaitingQuestion));
    }

    #[test]
    fn idle_draft_expires() {
        let sessions = IntakeSessions::new(Duration::from_millis(10));
        sessions.begin(ANN, CHAT);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(sessions.feed(ANN, "Lunch?"), None);
        assert!(sessions.step(ANN).is_none());
    }

    #[test]
    fn purge_expired_counts_dropped() {
        let sessions = IntakeSessions::new(Duration::from_millis(10));
        sessions.begin(ANN, CHAT);
        sessions.begin(UserId(2), CHAT);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(sessions.purge_expired(), 2);
    }
}
