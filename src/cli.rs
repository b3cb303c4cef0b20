//! Command-line interface for WastelandSim

use clap::Parser;
use std::path::PathBuf;

/// Real-time wasteland combat simulator (headless)
#[derive(Parser, Debug)]
#[command(name = "wastelandsim")]
#[command(about = "Run scripted combat scenarios without a renderer")]
#[command(version)]
pub struct Args {
    /// JSON scenario file to run
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub scenario: PathBuf,

    /// Output path for the combat log (overrides the scenario's)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum simulated duration in seconds (overrides the scenario's)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Random seed (overrides the scenario's)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the result as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}
