mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use detour_core::TravelMode;
use tracing_subscriber::EnvFilter;

use commands::check::{CheckArgs, Decision};

#[derive(Parser)]
#[command(name = "detour")]
#[command(about = "Check a new appointment against your day, travel time included")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG wins if set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a drafted appointment and optionally delay it
    Check {
        title: String,

        /// Start date/time (e.g., "2025-03-20T15:00")
        #[arg(short, long)]
        start: String,

        /// End date/time
        #[arg(short, long, conflicts_with = "duration")]
        end: Option<String>,

        /// Length instead of an end time (e.g., "45m", "1h 30m")
        #[arg(short, long)]
        duration: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        /// transit, driving, walking or bicycling
        #[arg(short, long)]
        mode: Option<TravelMode>,

        /// JSON file with locally drafted events (overrides `local_events` in config)
        #[arg(long)]
        events: Option<PathBuf>,

        /// Include the configured calendar provider and save the event there
        #[arg(short, long)]
        calendar: bool,

        /// Accept the recommended delay without asking
        #[arg(short, long, conflicts_with = "no_apply")]
        yes: bool,

        /// Only show the recommendation; change nothing
        #[arg(long)]
        no_apply: bool,
    },
    /// Show the config file location and effective settings
    Config {
        /// Write a commented default config file if there is none
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check {
            title,
            start,
            end,
            duration,
            location,
            mode,
            events,
            calendar,
            yes,
            no_apply,
        } => {
            let decision = if no_apply {
                Decision::NoApply
            } else if yes {
                Decision::Accept
            } else {
                Decision::Ask
            };
            commands::check::run(CheckArgs {
                title,
                start,
                end,
                duration,
                location,
                mode,
                events,
                calendar,
                decision,
            })
            .await
        }
        Commands::Config { init } => commands::config::run(init),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
