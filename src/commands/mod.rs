//! Chat commands prefixed with `/`.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. The registry handles dispatch, alias resolution,
//! argument splitting, and dynamic help generation. Front ends can register
//! additional commands via `registry.register(Arc::new(MyCommand))`.

mod acting;
mod cancel;
mod closepoll;
mod done;
mod help;
mod newpoll;
mod retract;
mod quit;
mod show;
mod vote;
mod whoami;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::PollError;
use crate::intake::IntakeSessions;
use crate::poll::{Poll, ScopeId, UserId};
use crate::service::PollService;

/// Who is talking, where, and the services they can reach.
pub struct ChatContext<'a> {
    pub service: &'a PollService,
    pub intake: &'a IntakeSessions,
    pub scope: ScopeId,
    pub user: UserId,
    pub name: Option<&'a str>,
    pub db_label: &'a str,
}

impl ChatContext<'_> {
    /// The chat's current poll, or print why there is none.
    pub(crate) async fn active_poll(&self) -> Option<Poll> {
        match self.service.polls().active_poll(self.scope).await {
            Ok(poll) => Some(poll),
            Err(e) => {
                report(&e);
                None
            }
        }
    }
}

/// Print a failure the way the chat shows it.
pub(crate) fn report(err: &PollError) {
    println!("  {}", err.message());
    if err.is_transient() {
        tracing::warn!(error = %err, "transient failure");
    }
}

/// A state change the REPL needs to apply after a command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Continue as a different chat member.
    Actor { user: UserId, name: Option<String> },
}

/// What the REPL should do after a command runs.
#[derive(Debug)]
pub enum CommandResult {
    /// Not a command; pass input to the poll draft, if any.
    NotACommand,
    /// Command handled, continue the REPL loop.
    Handled,
    /// Command produced a state change the REPL must apply.
    StateChanged(StateChange),
    /// Exit the REPL.
    Quit,
}

/// A chat command. Implement this trait to add new commands.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"/vote"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["/h", "/?"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument synopsis for `/help`, e.g. `"<n>"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `/help`.
    fn description(&self) -> &str;

    /// Run the command. `args` is everything after the command name, trimmed.
    async fn execute(&self, args: &str, ctx: &ChatContext<'_>) -> CommandResult;
}

/// Holds registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(help::HelpCommand),
            Arc::new(newpoll::NewPollCommand),
            Arc::new(done::DoneCommand),
            Arc::new(cancel::CancelCommand),
            Arc::new(vote::VoteCommand),
            Arc::new(retract::RetractCommand),
            Arc::new(show::ShowCommand),
            Arc::new(closepoll::ClosePollCommand),
            Arc::new(acting::ActAsCommand),
            Arc::new(whoami::WhoamiCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    /// Register an additional command.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Dispatch input to a matching command, or return `NotACommand`.
    pub async fn dispatch(&self, input: &str, ctx: &ChatContext<'_>) -> CommandResult {
        let input = input.trim();
        let (cmd, args) = match input.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd, args.trim()),
            None => (input, ""),
        };

        for command in &self.commands {
            if cmd == command.name() || command.aliases().contains(&cmd) {
                // /help is special, it needs the registry to list all commands
                if command.name() == "/help" {
                    print!("{}", self.help_text());
                    return CommandResult::Handled;
                }
                return command.execute(args, ctx).await;
            }
        }

        if cmd.starts_with('/') {
            println!("unknown command: {cmd}");
            println!("type /help for available commands");
            return CommandResult::Handled;
        }

        CommandResult::NotACommand
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.usage(), c.aliases()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out
    }

    /// All registered command names (for testing).
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases (for duplicate detection).
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let head = if usage.is_empty() {
        name.to_string()
    } else {
        format!("{name} {usage}")
    };
    if aliases.is_empty() {
        head
    } else {
        format!("{} ({})", head, aliases.join(", "))
    }
}
