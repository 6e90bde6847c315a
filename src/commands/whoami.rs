use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult};

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn name(&self) -> &str {
        "/whoami"
    }

    fn description(&self) -> &str {
        "show the acting user, chat, and database"
    }

    async fn execute(&self, _args: &str, ctx: &ChatContext<'_>) -> CommandResult {
        println!("  user      {} ({})", ctx.user, ctx.name.unwrap_or("anonymous"));
        println!("  chat      {}", ctx.scope);
        println!("  database  {}", ctx.db_label);
        if ctx.intake.step(ctx.user).is_some() {
            println!("  drafting  a new poll (/done to finish, /cancel to abort)");
        }
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::TestChat;

    #[tokio::test]
    async fn returns_handled() {
        let chat = TestChat::new();
        assert!(matches!(
            WhoamiCommand.execute("", &chat.ctx()).await,
            CommandResult::Handled
        ));
    }

    #[test]
    fn metadata() {
        assert_eq!(WhoamiCommand.name(), "/whoami");
        assert!(WhoamiCommand.aliases().is_empty());
    }
}
