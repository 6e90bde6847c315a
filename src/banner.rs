//! Startup banner and farewell.

use crate::consts::{AUTHOR, HOMEPAGE, REPO};
use crate::poll::{ScopeId, UserId};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub database: &'a str,
    pub scope: ScopeId,
    pub user: UserId,
    pub name: Option<&'a str>,
    pub op_timeout_ms: u128,
    pub intake_ttl_secs: u64,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║          Q U O T A P O L L            ║
   ║    every option has a fixed number    ║
   ║               of seats                ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   database  {}
   chat      {}
   user      {} ({})
   limits    {} ms per operation, drafts expire after {} s

   type /help for commands
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.database,
        info.scope,
        info.user,
        info.name.unwrap_or("anonymous"),
        info.op_timeout_ms,
        info.intake_ttl_secs,
    );
}

/// Print the farewell line.
pub fn print_goodbye() {
    println!("goodbye.");
}
