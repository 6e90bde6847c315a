use async_trait::async_trait;

use super::{ChatContext, Command, CommandResult, report};
use crate::display;

pub struct ShowCommand;

#[async_trait]
impl Command for ShowCommand {
    fn name(&self) -> &str {
        "/poll"
    }

    fn aliases(&self) -> &[&str] {
        &["/show", "/tally"]
    }

    fn usage(&self) -> &str {
        "[json]"
    }

    fn description(&self) -> &str {
        "show the active poll"
    }

    async fn execute(&self, args: &str, ctx: &ChatContext<'_>) -> CommandResult {
        let Some(poll) = ctx.active_poll().await else {
            return CommandResult::Handled;
        };
        let tally = match ctx.service.votes().tally(poll.id).await {
            Ok(tally) => tally,
            Err(e) => {
                report(&e);
                return CommandResult::Handled;
            }
        };

        if args == "json" {
            match serde_json::to_string_pretty(&tally) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("  ✗ failed to encode poll: {e}"),
            }
            return CommandResult::Handled;
        }

        print!("{}", display::render(&tally));
        for (i, label) in display::action_labels(&tally).iter().enumerate() {
            if i < tally.options.len() {
                println!("  [/vote {}] {label}", i + 1);
            } else {
                println!("  [/retract] {label}");
            }
        }
        CommandResult::Handled
    }
}
