//! Development tasks for the combat workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod utils;

use anyhow::Result;
use clap::Parser;
use commands::{CheckConfig, Simulate};
use tracing_subscriber::EnvFilter;

/// Development tasks for the combat workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for turn-based combat", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run a headless encounter with scripted decisions
    Simulate(Simulate),

    /// Load a combat config and print the effective values
    CheckConfig(CheckConfig),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Simulate(cmd) => cmd.execute(),
        Command::CheckConfig(cmd) => cmd.execute(),
    }
}
