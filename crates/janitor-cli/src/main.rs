use clap::{ArgAction, Parser, Subcommand};
use commands::{config, daemon, plex_token, run};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "janitor")]
#[command(about = "Radarr Janitor - Unmonitor what you've watched, clean up what you won't")]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass
    #[command(long_about = "Unmonitor Radarr movies that were watched in Plex after they were added, then remove unmonitored movies and (with the language filter on) movies in other languages. Members of the protected Plex collection are never removed. Configuration comes from the environment unless --config is given.")]
    Run {
        /// Read configuration from this YAML file instead of the environment
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Log decisions without changing anything in Radarr
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Run on a cron schedule with the internal scheduler
    #[command(long_about = "Keep running and perform a reconciliation pass on every tick of the cron schedule. A pass runs immediately on startup unless --no-startup-run is specified. A failed pass is logged and the next tick runs as usual.")]
    Daemon {
        /// Read configuration from this YAML file instead of the environment
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Cron schedule with seconds (e.g., '0 0 */6 * * *' for every 6 hours)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: String,

        /// Skip the pass on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_run: bool,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Sign in to plex.tv and print the account token
    #[command(long_about = "Sign in to plex.tv with a username and password and print the account token. Put the token in PLEX_USER_TOKEN so runs read the account's watch history without storing the password.")]
    PlexToken {
        /// Plex username or email (if not provided, will prompt)
        #[arg(long)]
        username: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (masks secrets)
    Show {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Validate configuration and check that Radarr and Plex are reachable
    Check {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let output = output::Output::new(cli.output, cli.quiet);
    let verbosity = logging::Verbosity::new(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run { config, dry_run } => run::run_once(config, dry_run, verbosity, &output).await,
        Commands::Daemon {
            config,
            schedule,
            no_startup_run,
        } => daemon::run_daemon(config, schedule, no_startup_run, verbosity, &output).await,
        Commands::Config { cmd } => {
            logging::init_console(verbosity).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
            config::run_config(cmd, &output).await
        }
        Commands::PlexToken { username } => {
            logging::init_console(verbosity).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
            plex_token::run_plex_token(username, &output).await
        }
    }
}
