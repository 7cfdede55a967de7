//! panocube CLI - Command-line interface
//!
//! Converts equirectangular panoramas into cube map tours, fetches remote
//! inputs, inspects leftover jobs and edits the configuration file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::common::{parse_remote_file, StrategyArg};
use commands::config::ConfigCommands;
use commands::convert::ConvertArgs;
use commands::fetch::FetchArgs;
use panocube::fetch::RemoteFile;

#[derive(Parser)]
#[command(name = "panocube")]
#[command(version = panocube::VERSION)]
#[command(about = "Convert 360° panoramas into cube map tours", long_about = None)]
struct Cli {
    /// Log at debug level and echo log output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a panorama file, or every panorama in a directory
    Convert {
        /// Panorama file or directory of panoramas (jpg, jpeg, png)
        input: PathBuf,

        /// Project name (default: the input directory or file name)
        #[arg(long, short)]
        project: Option<String>,

        /// Cube face size in pixels (default from config: 1920)
        #[arg(long)]
        size: Option<u32>,

        /// Face rendering strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Face workers for the parallel strategy (1-6)
        #[arg(long)]
        workers: Option<usize>,

        /// Convert at most this many scenes; the rest are reported as deferred
        #[arg(long)]
        max_scenes: Option<usize>,
    },

    /// Download panoramas from the drive service and convert them
    Fetch {
        /// Project name
        #[arg(long, short)]
        project: String,

        /// Remote file as ID:NAME (repeatable)
        #[arg(long = "file", short = 'f', value_parser = parse_remote_file, required = true)]
        files: Vec<RemoteFile>,

        /// Drive API key for the size probe (default from config)
        #[arg(long)]
        api_key: Option<String>,

        /// Cube face size in pixels (default from config: 1920)
        #[arg(long)]
        size: Option<u32>,
    },

    /// List jobs left in the ledger by an interrupted run
    Jobs {
        /// Remove the leftover entries after listing them
        #[arg(long)]
        discard: bool,
    },

    /// View or modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            project,
            size,
            strategy,
            workers,
            max_scenes,
        } => commands::convert::run(
            ConvertArgs {
                input,
                project,
                size,
                strategy,
                workers,
                max_scenes,
            },
            cli.verbose,
        ),
        Commands::Fetch {
            project,
            files,
            api_key,
            size,
        } => commands::fetch::run(
            FetchArgs {
                project,
                files,
                api_key,
                size,
            },
            cli.verbose,
        ),
        Commands::Jobs { discard } => commands::jobs::run(discard),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
