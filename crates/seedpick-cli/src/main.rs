use clap::{ArgAction, Parser, Subcommand};
use commands::{config, daemon, history, select};
use live_select_config::{Config, PathManager};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "seedpick")]
#[command(about = "seedpick - pick live rooms for star and seed collection")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build this run's candidate list and record the visits
    #[command(long_about = "Fetch the rooms currently on air, drop excluded rooms and rooms visited within the validity window, and print at most max_candidates rooms. The printed rooms are recorded as visited unless --dry-run is given.")]
    Select {
        /// Read the live listing from a JSON file instead of the platform API
        #[arg(long, value_name = "FILE")]
        snapshot_file: Option<PathBuf>,

        /// Print candidates without recording visits
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,

        /// Override the configured category
        #[arg(long)]
        category: Option<String>,

        /// Override the configured maximum number of candidates
        #[arg(long)]
        max_candidates: Option<i64>,
    },
    /// Run selection periodically with the internal scheduler
    #[command(long_about = "Run selection on a cron schedule until interrupted. Only one process may use a given visit history file at a time; runs inside the daemon never overlap.")]
    Daemon {
        /// Cron schedule expression with seconds (e.g., '0 */30 * * * *')
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip the run on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_run: bool,
    },
    /// Inspect or reset the visit history
    History {
        #[command(subcommand)]
        cmd: HistoryCommands,
    },
    /// Show or create the configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List rooms still inside the cooldown window
    Show,
    /// Delete the visit history file (all rooms become eligible again)
    Clear,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration and resolved file paths
    Show,
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathManager::default().config_file());

    // Logging settings come from the config when it is readable; commands report load errors themselves
    let (log_file, log_json) = Config::load_from_file(&config_path)
        .map(|c| (c.log_file_path(), c.logging.json))
        .unwrap_or_default();
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file, log_json)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Select {
            snapshot_file,
            dry_run,
            category,
            max_candidates,
        } => {
            let overrides = select::SelectOverrides { category, max_candidates };
            select::run_select(&config_path, overrides, snapshot_file, dry_run, &output).await
        }
        Commands::Daemon {
            schedule,
            no_startup_run,
        } => daemon::run_daemon(&config_path, schedule, no_startup_run, &output).await,
        Commands::History { cmd } => history::run_history(cmd, &config_path, &output),
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show);
            config::run_config(cmd, &config_path, &output)
        }
    }
}
