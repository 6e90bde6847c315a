use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult};

pub struct NewPollCommand;

#[async_trait]
impl Command for NewPollCommand {
    fn name(&self) -> &str {
        "/newpoll"
    }

    fn description(&self) -> &str {
        "start creating a poll with vote limits"
    }

    async fn execute(&self, _args: &str, ctx: &ChatContext<'_>) -> CommandResult {
        ctx.intake.begin(ctx.user, ctx.scope);
        println!("  📊 Creating a new poll with vote limits\n");
        println!("  Please send me the poll question:");
        CommandResult::Handled
    }
}
