use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult, report};
use crate::poll::CastOutcome;

pub struct VoteCommand;

#[async_trait]
impl Command for VoteCommand {
    fn name(&self) -> &str {
        "/vote"
    }

    fn usage(&self) -> &str {
        "<n>"
    }

    fn description(&self) -> &str {
        "vote for option number n of the active poll"
    }

    async fn execute(&self, args: &str, ctx: &ChatContext<'_>) -> CommandResult {
        let Ok(number) = args.parse::<usize>() else {
            println!("  usage: /vote {}", self.usage());
            return CommandResult::Handled;
        };
        let Some(poll) = ctx.active_poll().await else {
            return CommandResult::Handled;
        };

        let options = match ctx.service.votes().tally(poll.id).await {
            Ok(tally) => tally.options,
            Err(e) => {
                report(&e);
                return CommandResult::Handled;
            }
        };
        let Some(target) = number.checked_sub(1).and_then(|i| options.get(i)) else {
            println!("  {}", CastOutcome::RejectedUnknownOption.message());
            return CommandResult::Handled;
        };

        match ctx
            .service
            .votes()
            .cast_vote(
                poll.id,
                target.option.id,
                ctx.user,
                ctx.name.map(str::to_string),
            )
            .await
        {
            Ok(outcome) => println!("  {}", outcome.message()),
            Err(e) => report(&e),
        }
        CommandResult::Handled
    }
}
