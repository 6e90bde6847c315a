use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

use super::PollStore;
use crate::error::StoreError;
use crate::poll::{
    NewPoll, NewVote, OptionId, Poll, PollId, PollOption, PollSnapshot, PollState, ScopeId, UserId,
    Vote,
};

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS polls (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id     INTEGER NOT NULL,
        message_ref TEXT,
        question    TEXT NOT NULL,
        created_by  INTEGER NOT NULL,
        is_active   INTEGER NOT NULL DEFAULT 1,
        created_at  TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS poll_options (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        poll_id     INTEGER NOT NULL REFERENCES polls(id),
        option_text TEXT NOT NULL,
        vote_limit  INTEGER NOT NULL CHECK (vote_limit >= 1),
        position    INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS votes (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        poll_id   INTEGER NOT NULL REFERENCES polls(id),
        option_id INTEGER NOT NULL REFERENCES poll_options(id),
        user_id   INTEGER NOT NULL,
        username  TEXT,
        voted_at  TEXT NOT NULL,
        UNIQUE (poll_id, user_id)
    );

    CREATE INDEX IF NOT EXISTS idx_polls_chat_active ON polls (chat_id, is_active);
    CREATE INDEX IF NOT EXISTS idx_votes_option ON votes (option_id);
";

const POLL_COLUMNS: &str = "id, chat_id, message_ref, question, created_by, is_active, created_at";
const OPTION_COLUMNS: &str = "id, poll_id, option_text, vote_limit, position";
const VOTE_COLUMNS: &str = "poll_id, option_id, user_id, username, voted_at";

/// SQLite-backed poll store.
pub struct SqlitePollStore {
    conn: Mutex<Connection>,
}

impl SqlitePollStore {
    /// Open or create the poll tables in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }
}

fn poll_from_row(row: &Row<'_>) -> rusqlite::Result<Poll> {
    let active: bool = row.get(5)?;
    Ok(Poll {
        id: PollId(row.get(0)?),
        scope: ScopeId(row.get(1)?),
        message_ref: row.get(2)?,
        question: row.get(3)?,
        creator: UserId(row.get(4)?),
        state: if active {
            PollState::Open
        } else {
            PollState::Closed
        },
        created_at: row.get::<_, DateTime<Utc>>(6)?,
    })
}

fn option_from_row(row: &Row<'_>) -> rusqlite::Result<PollOption> {
    Ok(PollOption {
        id: OptionId(row.get(0)?),
        poll_id: PollId(row.get(1)?),
        text: row.get(2)?,
        quota: row.get(3)?,
        position: row.get(4)?,
    })
}

fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<Vote> {
    Ok(Vote {
        poll_id: PollId(row.get(0)?),
        option_id: OptionId(row.get(1)?),
        user: UserId(row.get(2)?),
        display_name: row.get(3)?,
        cast_at: row.get::<_, DateTime<Utc>>(4)?,
    })
}

fn load_poll(conn: &Connection, id: PollId) -> rusqlite::Result<Option<Poll>> {
    conn.query_row(
        &format!("SELECT {POLL_COLUMNS} FROM polls WHERE id = ?1"),
        [id.0],
        poll_from_row,
    )
    .optional()
}

fn load_options(conn: &Connection, poll_id: PollId) -> rusqlite::Result<Vec<PollOption>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OPTION_COLUMNS} FROM poll_options WHERE poll_id = ?1 ORDER BY position ASC"
    ))?;
    stmt.query_map([poll_id.0], option_from_row)?
        .collect::<Result<Vec<_>, _>>()
}

fn load_vote(conn: &Connection, poll_id: PollId, user: UserId) -> rusqlite::Result<Option<Vote>> {
    conn.query_row(
        &format!("SELECT {VOTE_COLUMNS} FROM votes WHERE poll_id = ?1 AND user_id = ?2"),
        [poll_id.0, user.0],
        vote_from_row,
    )
    .optional()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[async_trait]
impl PollStore for SqlitePollStore {
    async fn insert_poll(&self, poll: NewPoll) -> Result<PollId, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO polls (chat_id, question, created_by, is_active, created_at)
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![poll.scope.0, poll.question, poll.creator.0, Utc::now()],
        )?;
        let poll_id = tx.last_insert_rowid();
        for (position, option) in poll.options.iter().enumerate() {
            tx.execute(
                "INSERT INTO poll_options (poll_id, option_text, vote_limit, position)
                 VALUES (?1, ?2, ?3, ?4)",
                params![poll_id, option.text, option.quota, position as i64],
            )?;
        }
        tx.commit()?;
        Ok(PollId(poll_id))
    }

    async fn poll(&self, id: PollId) -> Result<Option<Poll>, StoreError> {
        let conn = self.conn()?;
        Ok(load_poll(&conn, id)?)
    }

    async fn latest_open_poll(&self, scope: ScopeId) -> Result<Option<Poll>, StoreError> {
        let conn = self.conn()?;
        let poll = conn
            .query_row(
                &format!(
                    "SELECT {POLL_COLUMNS} FROM polls
                     WHERE chat_id = ?1 AND is_active = 1
                     ORDER BY id DESC LIMIT 1"
                ),
                [scope.0],
                poll_from_row,
            )
            .optional()?;
        Ok(poll)
    }

    async fn set_message_ref(&self, id: PollId, message_ref: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE polls SET message_ref = ?1 WHERE id = ?2",
            params![message_ref, id.0],
        )?;
        Ok(())
    }

    async fn close_poll(&self, id: PollId) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute("UPDATE polls SET is_active = 0 WHERE id = ?1", [id.0])?;
        Ok(())
    }

    async fn options(&self, poll_id: PollId) -> Result<Vec<PollOption>, StoreError> {
        let conn = self.conn()?;
        Ok(load_options(&conn, poll_id)?)
    }

    async fn option(&self, id: OptionId) -> Result<Option<PollOption>, StoreError> {
        let conn = self.conn()?;
        let option = conn
            .query_row(
                &format!("SELECT {OPTION_COLUMNS} FROM poll_options WHERE id = ?1"),
                [id.0],
                option_from_row,
            )
            .optional()?;
        Ok(option)
    }

    async fn vote(&self, poll_id: PollId, user: UserId) -> Result<Option<Vote>, StoreError> {
        let conn = self.conn()?;
        Ok(load_vote(&conn, poll_id, user)?)
    }

    async fn count_votes(&self, option_id: OptionId) -> Result<u32, StoreError> {
        let conn = self.conn()?;
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM votes WHERE option_id = ?1",
            [option_id.0],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn insert_vote(&self, vote: NewVote) -> Result<Vote, StoreError> {
        let conn = self.conn()?;
        let cast_at = Utc::now();
        conn.execute(
            "INSERT INTO votes (poll_id, option_id, user_id, username, voted_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vote.poll_id.0,
                vote.option_id.0,
                vote.user.0,
                vote.display_name,
                cast_at
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict
            } else {
                StoreError::Sqlite(e)
            }
        })?;
        Ok(Vote {
            poll_id: vote.poll_id,
            option_id: vote.option_id,
            user: vote.user,
            display_name: vote.display_name,
            cast_at,
        })
    }

    async fn delete_vote(&self, poll_id: PollId, user: UserId) -> Result<Option<Vote>, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let existing = load_vote(&tx, poll_id, user)?;
        if existing.is_some() {
            tx.execute(
                "DELETE FROM votes WHERE poll_id = ?1 AND user_id = ?2",
                [poll_id.0, user.0],
            )?;
        }
        tx.commit()?;
        Ok(existing)
    }

    async fn snapshot(&self, poll_id: PollId) -> Result<Option<PollSnapshot>, StoreError> {
        let conn = self.conn()?;
        let Some(poll) = load_poll(&conn, poll_id)? else {
            return Ok(None);
        };
        let options = load_options(&conn, poll_id)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE poll_id = ?1 ORDER BY id ASC"
        ))?;
        let votes = stmt
            .query_map([poll_id.0], vote_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(PollSnapshot {
            poll,
            options,
            votes,
        }))
    }
}
