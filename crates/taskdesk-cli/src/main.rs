//! taskdesk - a command-line client for the tasks/notes service.
//!
//! Every invocation restores the saved session first, then runs one
//! command against the REST API.

mod app;
mod commands;
mod views;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use commands::{notes::NoteCommand, tasks::TaskCommand, theme::ThemeCommand};
use taskdesk_core::config::API_URL_ENV;
use taskdesk_core::Config;

/// Log file name prefix inside the data directory
const LOG_FILE_PREFIX: &str = "taskdesk.log";

#[derive(Parser)]
#[command(name = "taskdesk", version, about = "Manage your tasks and notes from the terminal")]
struct Cli {
    /// API base URL (overrides the config file)
    #[arg(long, env = API_URL_ENV, global = true)]
    api_url: Option<String>,

    /// Keep the session in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Print JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign in and save the session
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Recent tasks and notes
    Dashboard,
    /// List and manage tasks
    #[command(subcommand)]
    Tasks(TaskCommand),
    /// List and manage notes
    #[command(subcommand)]
    Notes(NoteCommand),
    /// Show or change the color theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeCommand>,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {:#}. Using default configuration.", e);
            Config::default()
        }
    };

    let log_dir = if cli.ephemeral {
        None
    } else {
        config.data_dir().ok().filter(|dir| std::fs::create_dir_all(dir).is_ok())
    };
    let _guard = init_tracing(log_dir.as_deref());
    info!("taskdesk starting");

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let mut app = App::new(config, cli.api_url, cli.ephemeral, cli.json)?;

    let outcome = app.restore_session().await;
    debug!(?outcome, "Session ready");

    match cli.command {
        Command::Register { email } => commands::account::register(&mut app, email).await,
        Command::Login { email } => commands::account::login(&mut app, email).await,
        Command::Logout => commands::account::logout(&mut app),
        Command::Whoami => commands::account::whoami(&app),
        Command::Dashboard => commands::dashboard::show(&mut app).await,
        Command::Tasks(command) => commands::tasks::run(&mut app, command).await,
        Command::Notes(command) => commands::notes::run(&mut app, command).await,
        Command::Theme { action } => commands::theme::run(&mut app, action),
    }
}
