//! Mockup: drive a host image editor to composite shirt mockups.
//!
//! # Usage
//!
//! ```text
//! mockup run --model <psd> --shirt <png> --action <name> --group <set> --layer <name>
//!            [--bundle <atn>] [--color #RRGGBB] [--direction front|back] [--dry-run]
//! mockup inspect <bundle> [--dry-run]
//! mockup diff <before.json> <after.json> [--json]
//! mockup config show|init|path
//! mockup logs [--lines N]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigCommand, diff::DiffArgs, inspect::InspectArgs, logs::LogsArgs, run::RunArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "mockup",
    version,
    about = "Composite shirt mockups by scripting a host image editor",
    long_about = None,
)]
struct Cli {
    /// Config file to use instead of ~/.mockup/config.yaml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Composite a shirt image into a model document by playing a preset.
    Run(RunArgs),

    /// Load a preset bundle and report the first preset it adds.
    Inspect(InspectArgs),

    /// Compare two registry snapshots and list the additions.
    Diff(DiffArgs),

    /// Show or create the configuration file.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Print recent lines of the task log.
    Logs(LogsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    mockup_bridge::init_tracing(cli.json_logs);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => args.run(config),
        Commands::Inspect(args) => args.run(config),
        Commands::Diff(args) => args.run(),
        Commands::Config { command } => commands::config::run(command, config),
        Commands::Logs(args) => args.run(config),
    }
}
