#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for inspecting wave plans and running headless sessions.

mod commands;
mod config;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use harpoon_core::WELCOME_BANNER;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "harpoon", version, about = WELCOME_BANNER, long_about = None)]
struct Cli {
    /// Campaign TOML to load instead of the embedded default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level regardless of RUST_LOG.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the spawn plan of a single wave.
    Plan {
        /// Wave number, starting at 1.
        #[arg(long)]
        wave: u32,
        /// Emit JSON instead of a text table.
        #[arg(long)]
        json: bool,
    },
    /// Print a summary row for every wave of the campaign.
    Table,
    /// Run a headless session through the state machine and the spawner.
    Session {
        /// Number of waves to play.
        #[arg(long, default_value_t = 3)]
        waves: u32,
        /// Simulation step in milliseconds.
        #[arg(long, default_value_t = 100)]
        step_ms: u64,
    },
}

/// Entry point for the Harpoon command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let campaign = config::load(cli.config.as_deref())?;
    debug!(
        tiers = campaign.tiers.len(),
        max_waves = campaign.planner.tuning().max_waves,
        "campaign loaded"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Plan { wave, json } => commands::plan(&campaign, wave, json, &mut out),
        Command::Table => commands::table(&campaign, &mut out),
        Command::Session { waves, step_ms } => {
            commands::session(&campaign, waves, Duration::from_millis(step_ms), &mut out)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}
