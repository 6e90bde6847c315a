//! Project-wide constants.

use std::path::PathBuf;
use std::time::Duration;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// A poll needs at least this many options.
pub const MIN_OPTIONS: usize = 2;

/// Upper bound on waiting for a poll's lock or for a single store call.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// An unfinished poll draft is dropped after this much inactivity.
pub const DEFAULT_INTAKE_TTL: Duration = Duration::from_secs(600);

/// Number of cells in a tally progress bar.
pub const BAR_WIDTH: usize = 10;

/// Default database path: `~/.quotapoll/quotapoll.db`.
/// Single DB for polls and config.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".quotapoll")
        .join("quotapoll.db")
}
