use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotapoll::banner::{BannerInfo, print_banner, print_goodbye};
use quotapoll::commands::{ChatContext, CommandRegistry, CommandResult, StateChange};
use quotapoll::config::{Config, EngineConfig};
use quotapoll::consts::default_db_path;
use quotapoll::display;
use quotapoll::events::Event;
use quotapoll::intake::IntakeSessions;
use quotapoll::poll::{PollId, ScopeId, UserId};
use quotapoll::service::PollService;
use quotapoll::store::PollStore;
use quotapoll::store::memory::InMemoryPollStore;
use quotapoll::store::sqlite::SqlitePollStore;

#[derive(Parser)]
#[command(name = "quotapoll", version, about = "Group polls where every option has a fixed number of seats.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// SQLite database path (use :memory: for ephemeral)
    #[arg(short, long)]
    db: Option<String>,

    /// Chat the terminal speaks in
    #[arg(short, long, default_value_t = 1)]
    chat: i64,

    /// User id of the acting chat member
    #[arg(short, long, default_value_t = 1)]
    user: i64,

    /// Display name of the acting chat member
    #[arg(short, long)]
    name: Option<String>,

    /// Run a single line and exit (non-interactive)
    #[arg(short, long)]
    run: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Read or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print a setting
    Get { key: String },
    /// Change a setting
    Set { key: String, value: String },
    /// Restore a setting's default
    Unset { key: String },
}

/// Who the terminal currently speaks for.
struct Actor {
    user: UserId,
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let db_path = match cli.db {
        Some(path) => path,
        None => {
            let path = default_db_path();
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            path.to_string_lossy().into_owned()
        }
    };

    let config = Config::open(&db_path)?;
    if let Some(Command::Config { action }) = &cli.command {
        return handle_config(&config, action);
    }
    let engine_config = EngineConfig::load(&config)?;

    let store: Arc<dyn PollStore> = if db_path == ":memory:" {
        Arc::new(InMemoryPollStore::new())
    } else {
        Arc::new(SqlitePollStore::open(&db_path).context("failed to open poll database")?)
    };
    let service = PollService::new(store, &engine_config);
    let intake = IntakeSessions::new(engine_config.intake_ttl);
    let registry = CommandRegistry::new();
    let mut events = service.subscribe();

    let scope = ScopeId(cli.chat);
    let mut actor = Actor {
        user: UserId(cli.user),
        name: cli.name,
    };
    let db_label = if db_path == ":memory:" {
        "ephemeral"
    } else {
        db_path.as_str()
    };

    info!(db = %db_path, chat = %scope, "starting");

    // Single line mode
    if let Some(line) = cli.run {
        handle_line(&line, &registry, &service, &intake, scope, &mut actor, db_label).await;
        refresh_polls(&service, &mut events).await;
        return Ok(());
    }

    print_banner(&BannerInfo {
        database: db_label,
        scope,
        user: actor.user,
        name: actor.name.as_deref(),
        op_timeout_ms: engine_config.op_timeout.as_millis(),
        intake_ttl_secs: engine_config.intake_ttl.as_secs(),
    });

    // REPL: async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\n[{}] {}> ", scope, actor.name.as_deref().unwrap_or(&actor.user.to_string()));
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        let quit =
            handle_line(&line, &registry, &service, &intake, scope, &mut actor, db_label).await;
        refresh_polls(&service, &mut events).await;
        intake.purge_expired();
        if quit {
            break;
        }
    }

    print_goodbye();
    Ok(())
}

/// Run one line of chat input. Returns `true` when the user asked to quit.
async fn handle_line(
    line: &str,
    registry: &CommandRegistry,
    service: &PollService,
    intake: &IntakeSessions,
    scope: ScopeId,
    actor: &mut Actor,
    db_label: &str,
) -> bool {
    let ctx = ChatContext {
        service,
        intake,
        scope,
        user: actor.user,
        name: actor.name.as_deref(),
        db_label,
    };
    match registry.dispatch(line, &ctx).await {
        CommandResult::NotACommand => {
            if let Some(reply) = intake.feed(actor.user, line.trim()) {
                println!("  {}", reply.message());
            }
        }
        CommandResult::Handled => {}
        CommandResult::StateChanged(StateChange::Actor { user, name }) => {
            println!("  now acting as {} ({})", user, name.as_deref().unwrap_or("anonymous"));
            actor.user = user;
            actor.name = name;
        }
        CommandResult::Quit => return true,
    }
    false
}

/// Re-render every poll that changed since the last line, like a chat
/// message being edited in place.
async fn refresh_polls(service: &PollService, events: &mut broadcast::Receiver<Event>) {
    let mut changed: Vec<PollId> = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => {
                let id = event.poll_id();
                if !changed.contains(&id) {
                    changed.push(id);
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    for poll_id in changed {
        match service.votes().tally(poll_id).await {
            Ok(tally) => print!("\n{}", display::render(&tally)),
            Err(e) => eprintln!("  ✗ could not refresh poll {poll_id}: {e}"),
        }
    }
}

fn handle_config(config: &Config, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => match config.get(key)? {
            Some(value) => println!("{value}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config.set(key, value)?;
            println!("✓ {key} = {value}");
        }
        ConfigAction::Unset { key } => {
            config.remove(key)?;
            println!("✓ {key} restored to default");
        }
    }
    Ok(())
}
