//! GeoJoin CLI - Command-line interface
//!
//! This binary provides a command-line interface to the GeoJoin library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::init::InitArgs;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "geojoin")]
#[command(version = geojoin::VERSION)]
#[command(about = "Join GeoJSON sources by intersection and publish a deduplicated layer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the configured sources, run the spatial join and publish the layer
    Run {
        /// Config file (default: ~/.geojoin/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Source whose features drive the join
        #[arg(long)]
        probe: Option<String>,

        /// Source queried for features intersecting each probe feature
        #[arg(long)]
        target: Option<String>,

        /// Concurrent queries per batch (1-100)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Seconds to wait for sources to load (0 waits indefinitely)
        #[arg(long)]
        timeout: Option<u64>,

        /// Write the published layer to this GeoJSON file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Enable debug logging (also logs to stdout)
        #[arg(long)]
        debug: bool,
    },

    /// Write a default configuration file
    Init {
        /// Config file to write (default: ~/.geojoin/config.ini)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            probe,
            target,
            batch_size,
            timeout,
            output,
            debug,
        } => commands::run::run(RunArgs {
            config,
            probe,
            target,
            batch_size,
            timeout,
            output,
            debug,
        }),
        Commands::Init { config, force } => commands::init::run(InitArgs { config, force }),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
