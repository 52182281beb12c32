use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// u* threshold estimation for eddy-covariance flux records.
#[derive(Parser)]
#[command(
    name = "ustar",
    version,
    about = "Friction-velocity threshold estimation by change-point detection"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Estimate seasonal u* thresholds from a JSON observation record.
    Estimate(EstimateArgs),
}

/// Arguments for the `estimate` subcommand.
#[derive(clap::Args)]
pub struct EstimateArgs {
    /// Path to TOML configuration file. Built-in defaults apply without one.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Observation record (JSON with time, nee, ustar, temp, night arrays).
    /// Overrides `[io].input` from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Path for the JSON result. Overrides `[io].output` from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the run seed from config.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Override the number of bootstrap replicates from config.
    #[arg(long = "n-boot")]
    pub n_boot: Option<usize>,

    /// Include the per-cell two-parameter grid in the output.
    #[arg(long)]
    pub grid: bool,
}
