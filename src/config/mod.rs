//! Settings persisted next to the polls.
//!
//! [`Config`] is a raw key-value table sharing the database file with
//! [`SqlitePollStore`](crate::store::sqlite::SqlitePollStore). [`EngineConfig`]
//! is the typed view the engine runs with.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension};
use std::sync::Mutex;

use crate::consts::{DEFAULT_INTAKE_TTL, DEFAULT_OP_TIMEOUT};

/// Milliseconds to wait for a poll's lock or a store call.
pub const OP_TIMEOUT_KEY: &str = "op_timeout_ms";
/// Seconds an idle poll draft survives.
pub const INTAKE_TTL_KEY: &str = "intake_ttl_secs";

/// Keys accepted by `quotapoll config set`.
pub const KNOWN_KEYS: &[&str] = &[OP_TIMEOUT_KEY, INTAKE_TTL_KEY];

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("config connection lock poisoned"))
    }

    /// Get a config value by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a known config value (upsert). The value must parse.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if !KNOWN_KEYS.contains(&key) {
            bail!("unknown config key: {key} (known: {})", KNOWN_KEYS.join(", "));
        }
        parse_u64(key, value)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a config key, restoring its default.
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    let n: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got {value:?}"))?;
    if n == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(n)
}

/// Tunables for the engine and the poll-creation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub op_timeout: Duration,
    pub intake_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            op_timeout: DEFAULT_OP_TIMEOUT,
            intake_ttl: DEFAULT_INTAKE_TTL,
        }
    }
}

impl EngineConfig {
    /// Read overrides from `config`, falling back to defaults for unset keys.
    pub fn load(config: &Config) -> Result<Self> {
        let mut engine = Self::default();
        if let Some(v) = config.get(OP_TIMEOUT_KEY)? {
            engine.op_timeout = Duration::from_millis(parse_u64(OP_TIMEOUT_KEY, &v)?);
        }
        if let Some(v) = config.get(INTAKE_TTL_KEY)? {
            engine.intake_ttl = Duration::from_secs(parse_u64(INTAKE_TTL_KEY, &v)?);
        }
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_config() -> Config {
        Config::open(":memory:").unwrap()
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let config = mem_config();
        assert!(config.get(OP_TIMEOUT_KEY).unwrap().is_none());
    }

    #[test]
    fn set_overwrites_existing() {
        let config = mem_config();
        config.set(OP_TIMEOUT_KEY, "100").unwrap();
        config.set(OP_TIMEOUT_KEY, "250").unwrap();
        assert_eq!(config.get(OP_TIMEOUT_KEY).unwrap().unwrap(), "250");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let config = mem_config();
        let err = config.set("theme", "dark").unwrap_err();
        assert!(err.to_string().contains("unknown config key"));
    }

    #[test]
    fn set_rejects_non_numeric_and_zero() {
        let config = mem_config();
        assert!(config.set(INTAKE_TTL_KEY, "soon").is_err());
        assert!(config.set(INTAKE_TTL_KEY, "0").is_err());
        assert!(config.get(INTAKE_TTL_KEY).unwrap().is_none());
    }

    #[test]
    fn remove_restores_default() {
        let config = mem_config();
        config.set(INTAKE_TTL_KEY, "5").unwrap();
        config.remove(INTAKE_TTL_KEY).unwrap();
        assert_eq!(EngineConfig::load(&config).unwrap(), EngineConfig::default());
    }

    #[test]
    fn load_applies_overrides() {
        let config = mem_config();
        config.set(OP_TIMEOUT_KEY, "750").unwrap();
        config.set(INTAKE_TTL_KEY, "30").unwrap();

        let engine = EngineConfig::load(&config).unwrap();
        assert_eq!(engine.op_timeout, Duration::from_millis(750));
        assert_eq!(engine.intake_ttl, Duration::from_secs(30));
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config-test.db");
        let path_str = path.to_str().unwrap();

        {
            let config = Config::open(path_str).unwrap();
            config.set(OP_TIMEOUT_KEY, "1234").unwrap();
        }

        {
            let config = Config::open(path_str).unwrap();
            let engine = EngineConfig::load(&config).unwrap();
            assert_eq!(engine.op_timeout, Duration::from_millis(1234));
        }
    }
}
