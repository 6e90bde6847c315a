use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult};

pub struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    fn name(&self) -> &str {
        "/quit"
    }

    fn aliases(&self) -> &[&str] {
        &["quit", "exit", "/exit"]
    }

    fn description(&self) -> &str {
        "leave the chat"
    }

    async fn execute(&self, _args: &str, _ctx: &ChatContext<'_>) -> CommandResult {
        CommandResult::Quit
    }
}
