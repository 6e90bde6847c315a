use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult, StateChange};
use crate::poll::UserId;

/// Switch which chat member the terminal speaks for.
pub struct ActAsCommand;

fn parse_actor(args: &str) -> Option<StateChange> {
    let (id, name) = match args.split_once(char::is_whitespace) {
        Some((id, name)) => (id, Some(name.trim())),
        None => (args, None),
    };
    let user: i64 = id.parse().ok()?;
    Some(StateChange::Actor {
        user: UserId(user),
        name: name.filter(|n| !n.is_empty()).map(str::to_string),
    })
}

#[async_trait]
impl Command for ActAsCommand {
    fn name(&self) -> &str {
        "/as"
    }

    fn usage(&self) -> &str {
        "<user-id> [name]"
    }

    fn description(&self) -> &str {
        "act as another chat member"
    }

    async fn execute(&self, args: &str, _ctx: &ChatContext<'_>) -> CommandResult {
        match parse_actor(args) {
            Some(change) => CommandResult::StateChanged(change),
            None => {
                println!("  usage: /as {}", self.usage());
                CommandResult::Handled
            }
        }
    }
}
