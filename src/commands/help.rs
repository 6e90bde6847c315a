use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult};

/// Listed like any other command; the registry renders the actual text.
pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "/help"
    }

    fn aliases(&self) -> &[&str] {
        &["/h", "/?", "/start"]
    }

    fn description(&self) -> &str {
        "show this help"
    }

    async fn execute(&self, _args: &str, _ctx: &ChatContext<'_>) -> CommandResult {
        CommandResult::Handled
    }
}
