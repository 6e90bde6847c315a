use async_trait::async_trait;
use tracing::debug;

use super::{ChatContext, Command, CommandResult, report};

pub struct DoneCommand;

#[async_trait]
impl Command for DoneCommand {
    fn name(&self) -> &str {
        "/done"
    }

    fn description(&self) -> &str {
        "finish creating the poll"
    }

    async fn execute(&self, _args: &str, ctx: &ChatContext<'_>) -> CommandResult {
        let draft = match ctx.intake.finish(ctx.user) {
            Ok(draft) => draft,
            Err(e) => {
                println!("  {}", e.message());
                return CommandResult::Handled;
            }
        };

        let polls = ctx.service.polls();
        let poll_id = match polls
            .create_poll(draft.scope, ctx.user, &draft.question, draft.options)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                report(&e);
                return CommandResult::Handled;
            }
        };

        // The terminal shows every poll inline; the handle just records where.
        let message_ref = format!("terminal:{}:{}", draft.scope, poll_id);
        if polls.attach_message_ref(poll_id, &message_ref).await.is_err() {
            debug!(poll = %poll_id, "continuing without message reference");
        }

        println!("  ✅ Poll created!");
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{ANN, CHAT, TestChat};

    #[tokio::test]
    async fn creates_poll_from_draft() {
        let chat = TestChat::new();
        chat.intake.begin(ANN, CHAT);
        chat.intake.feed(ANN, "Lunch?");
        chat.intake.feed(ANN, "Pizza | 2");
        chat.intake.feed(ANN, "Salad | 1");

        DoneCommand.execute("", &chat.ctx()).await;

        let poll = chat.service.polls().active_poll(CHAT).await.unwrap();
        assert_eq!(poll.question, "Lunch?");
        assert_eq!(poll.creator, ANN);
        assert_eq!(
            poll.message_ref.as_deref(),
            Some(format!("terminal:{CHAT}:{}", poll.id).as_str())
        );
        assert!(chat.intake.step(ANN).is_none());
    }

    #[tokio::test]
    async fn too_few_options_creates_nothing() {
        let chat = TestChat::new();
        chat.intake.begin(ANN, CHAT);
        chat.intake.feed(ANN, "Lunch?");
        chat.intake.feed(ANN, "Pizza | 2");

        DoneCommand.execute("", &chat.ctx()).await;

        assert!(chat.service.polls().active_poll(CHAT).await.is_err());
        assert!(chat.intake.step(ANN).is_some());
    }
}
