use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult, report};

pub struct RetractCommand;

#[async_trait]
impl Command for RetractCommand {
    fn name(&self) -> &str {
        "/retract"
    }

    fn description(&self) -> &str {
        "retract your vote in the active poll"
    }

    async fn execute(&self, _args: &str, ctx: &ChatContext<'_>) -> CommandResult {
        let Some(poll) = ctx.active_poll().await else {
            return CommandResult::Handled;
        };
        match ctx.service.votes().retract_vote(poll.id, ctx.user).await {
            Ok(outcome) => println!("  {}", outcome.message()),
            Err(e) => report(&e),
        }
        CommandResult::Handled
    }
}
