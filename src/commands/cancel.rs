use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult};

pub struct CancelCommand;

#[async_trait]
impl Command for CancelCommand {
    fn name(&self) -> &str {
        "/cancel"
    }

    fn description(&self) -> &str {
        "cancel poll creation"
    }

    async fn execute(&self, _args: &str, ctx: &ChatContext<'_>) -> CommandResult {
        ctx.intake.cancel(ctx.user);
        println!("  Poll creation cancelled.");
        CommandResult::Handled
    }
}
