//! metatag command-line tagger
//!
//! Libraries are scanned into a local SQLite database; tag rules are
//! previewed and applied from here, and applied changes can be undone.

mod cli;

use clap::{Parser, Subcommand};
use cli::history::HistoryAction;
use cli::library::LibraryAction;
use cli::rule::RuleAction;
use cli::tag::TagAction;
use cli::Session;
use metatag_logging::{init_logging, metatag_home, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "metatag", version, about = "Regex tag rules for audio and document libraries")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Database file (overrides config.toml)
    #[arg(long, global = true, env = "METATAG_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register, scan and browse library folders
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
    /// Manage, preview and apply tag rules
    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },
    /// Show and edit tags of one file
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
    /// Review and undo applied changes
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let home = metatag_home();

    let log_dir = home.join("logs");
    let _log_guard = match init_logging(LogConfig {
        app_name: "metatag",
        verbose: cli.verbose,
        log_dir: Some(&log_dir),
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: logging disabled: {:#}", err);
            None
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("ERROR: Failed to start async runtime: {}", err);
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run_command(cli, home)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}

async fn run_command(cli: Cli, home: PathBuf) -> anyhow::Result<()> {
    let session = Session::open(&home, cli.db).await?;
    info!(command = ?cli.command, "Running command");

    let result = match cli.command {
        Commands::Library { action } => cli::library::run(&session, action).await,
        Commands::Rule { action } => cli::rule::run(&session, action).await,
        Commands::Tag { action } => cli::tag::run(&session, action).await,
        Commands::History { action } => cli::history::run(&session, action).await,
    };

    session.db.close().await;
    result
}
