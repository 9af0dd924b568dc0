//! phaseloop CLI - Drive the reference frame loop from the command line

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, phases, run};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phaseloop")]
#[command(about = "Phase-scoped callback scheduler with a reference frame loop", long_about = None)]
#[command(version)]
struct Cli {
    /// Log every callback and frame (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the subscribable phases and the host layout
    Phases,

    /// Verify a host layout against the expected phase shape
    Check {
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<String>,
    },

    /// Pump frames through the reference host with a logging subscriber
    Run {
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<String>,

        /// Number of frames to pump
        #[arg(long, default_value = "10")]
        frames: u64,

        /// Simulated frame time in seconds
        #[arg(long, default_value = "0.016666666666666666", value_parser = parse_dt)]
        dt: f64,

        /// Simulate a host mode transition every N frames
        #[arg(long)]
        transition_every: Option<u64>,

        /// Subscribe the demo subscriber again after each transition
        #[arg(long)]
        resubscribe: bool,

        /// Make the demo subscriber fail on its Nth update
        #[arg(long)]
        fail_at: Option<u64>,
    },
}

fn parse_dt(s: &str) -> Result<f64, String> {
    let dt: f64 = s.parse().map_err(|e| format!("invalid frame time: {}", e))?;
    if !dt.is_finite() || dt < 0.0 {
        return Err(format!("frame time must be a non-negative number, got {}", s));
    }
    Ok(dt)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Phases => phases::run(),
        Commands::Check { config } => check::run(config.as_deref()),
        Commands::Run {
            config,
            frames,
            dt,
            transition_every,
            resubscribe,
            fail_at,
        } => run::run(run::RunArgs {
            config,
            frames,
            dt,
            transition_every,
            resubscribe,
            fail_at,
        }),
    }
}
