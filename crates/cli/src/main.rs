use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use casker_core::{TaskManager, TaskManagerConfig};
use colored::*;
use tracing_subscriber::EnvFilter;

mod commands;

/// casker - A named-task runner
#[derive(Parser)]
#[command(name = "casker")]
#[command(about = "Run named shell tasks with their dependencies")]
#[command(version)]
struct Cli {
    /// Path to the casker.yml to use (defaults to searching upwards from --cwd)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to start searching for casker.yml from
    #[arg(long, default_value = ".")]
    cwd: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task with its dependencies; lists tasks when no name is given
    Run {
        /// Fully-qualified task or group name, e.g. "build" or "web:build"
        task: Option<String>,
    },
    /// List registered tasks and groups
    List,
    /// Show the execution stages for a task without running it
    Plan {
        /// Fully-qualified task or group name
        task: String,
    },
    /// Print the JSON schema of casker.yml
    Schema,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Schema generation needs no configuration file
    if let Commands::Schema = cli.command {
        return commands::schema::execute();
    }

    let manager = TaskManager::new(TaskManagerConfig {
        config_path: cli.config,
        start_dir: cli.cwd,
    })
    .map_err(|e| anyhow::anyhow!("Failed to load tasks: {}", e))?;

    if let Some(message) = manager.version_mismatch() {
        eprintln!("{} {}", "Warning:".yellow().bold(), message.yellow());
    }

    // Execute command (CLI layer only handles presentation)
    match cli.command {
        Commands::Run { task: Some(task) } => commands::run::execute(&manager, &task).await,
        Commands::Run { task: None } | Commands::List => commands::list::execute(&manager),
        Commands::Plan { task } => commands::plan::execute(&manager, &task),
        Commands::Schema => commands::schema::execute(),
    }
}
