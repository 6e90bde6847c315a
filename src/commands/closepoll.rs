use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult, report};

pub struct ClosePollCommand;

#[async_trait]
impl Command for ClosePollCommand {
    fn name(&self) -> &str {
        "/closepoll"
    }

    fn description(&self) -> &str {
        "close the active poll (creator only)"
    }

    async fn execute(&self, _args: &str, ctx: &ChatContext<'_>) -> CommandResult {
        match ctx
            .service
            .polls()
            .close_active_poll(ctx.scope, ctx.user)
            .await
        {
            Ok(_) => println!("  Poll closed!"),
            Err(e) => report(&e),
        }
        CommandResult::Handled
    }
}
