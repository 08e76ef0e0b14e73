//! hubscan - keeps the Hub scan CLI installed and in step with a Hub server.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::common::{GlobalArgs, PlatformArg};
use commands::config::ConfigCommands;
use error::CliError;
use hubscan::config::ConfigFile;

#[derive(Debug, Parser)]
#[command(name = "hubscan", version, about = "Install and inspect the Hub scan CLI")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read settings from this file instead of the default config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Install or update the scan CLI to match the Hub version
    Install {
        /// Install this version instead of asking the Hub
        #[arg(long, value_name = "VERSION")]
        hub_version: Option<String>,
    },

    /// Show what is installed
    Status,

    /// Check that the URL belongs to a Hub server
    Verify,

    /// Print the CLI download URL for the Hub
    DownloadUrl {
        /// Use this version instead of asking the Hub
        #[arg(long, value_name = "VERSION")]
        hub_version: Option<String>,

        /// Platform to choose the archive for
        #[arg(long, value_enum)]
        platform: Option<PlatformArg>,
    },

    /// View or change settings in config.ini
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "hubscan=debug" } else { "hubscan=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let command = match cli.command {
        Commands::Config { command } => {
            return commands::config::run(command, cli.config.as_deref());
        }
        command => command,
    };

    let config = match &cli.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    let settings = cli.global.resolve(&config);

    match command {
        Commands::Install { hub_version } => commands::install::run(&settings, hub_version),
        Commands::Status => commands::status::run(&settings),
        Commands::Verify => commands::verify::run(&settings),
        Commands::DownloadUrl {
            hub_version,
            platform,
        } => commands::download_url::run(&settings, hub_version, platform),
        Commands::Config { command } => commands::config::run(command, cli.config.as_deref()),
    }
}
