//! zkdump CLI
//!
//! Command-line interface for zkdump - restore and inspect ZooKeeper trees.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zkdump_core::config::split_hosts;
use zkdump_core::Config;

mod commands;
mod output;
mod progress;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "zkdump")]
#[command(about = "zkdump - ZooKeeper snapshot dump tools")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// ZooKeeper servers, comma separated (overrides config)
    #[arg(long, global = true)]
    hosts: Option<String>,

    /// Session timeout in milliseconds (overrides config)
    #[arg(long, global = true, value_name = "MS")]
    session_timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore a snapshot dump into ZooKeeper
    Import {
        /// Dump file to read
        #[arg(short, long)]
        file: PathBuf,
        /// Destination path the dump is restored under
        #[arg(short, long)]
        prefix: String,
        /// Replace the data of nodes that already exist
        #[arg(long)]
        overwrite: bool,
        /// Delete the destination subtree before importing
        #[arg(short = 'C', long)]
        clear: bool,
    },
    /// Show the total data size of a live subtree
    Du {
        /// Root of the subtree
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Decode a dump and summarize it without connecting
    Inspect {
        /// Dump file to read
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Show configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    init_logging();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(ref hosts) = cli.hosts {
        config.hosts = split_hosts(hosts);
    }
    if let Some(timeout) = cli.session_timeout {
        config.session_timeout_ms = timeout;
    }

    match cli.command {
        Commands::Import {
            file,
            prefix,
            overwrite,
            clear,
        } => {
            let args = commands::import::ImportArgs {
                file,
                prefix,
                overwrite,
                clear,
            };
            commands::import::run(&config, args, &output).await
        }
        Commands::Du { path } => commands::du::run(&config, &path, &output).await,
        Commands::Inspect { file } => commands::inspect::run(&config, &file, &output),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config::show(&config, &output),
        },
    }
}

/// Initialize logging to stderr
///
/// The filter comes from ZKDUMP_LOG (e.g. `debug`), defaulting to `warn`.
fn init_logging() {
    let level = std::env::var("ZKDUMP_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!("zkdump_core={},zkdump_cli={}", level, level));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}
