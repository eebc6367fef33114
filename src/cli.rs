//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::sim::sweep::{SweepParam, SweepRange};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Quarter-hour dispatch simulator for a flexible industrial plant"
)]
pub struct Cli {
    /// Log at debug level for this crate (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one scenario and print its KPI report.
    Run(RunArgs),

    /// Sweep two scenario parameters over a grid.
    Sweep(SweepArgs),

    /// Run one scenario over several price files.
    Portfolio(PortfolioArgs),
}

/// Where the scenario comes from. Defaults to the baseline preset.
#[derive(Debug, Clone, Args)]
#[group(multiple = false)]
pub struct ScenarioSource {
    /// Load scenario from a TOML file.
    #[arg(long, value_name = "PATH")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, flexible, battery_hybrid, tolling).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,
}

/// Where the prices come from.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct PriceSource {
    /// CSV price file (`timestamp,price`).
    #[arg(long, value_name = "CSV")]
    pub prices: Option<PathBuf>,

    /// Generate this many days of synthetic quarter-hour prices.
    #[arg(long, value_name = "DAYS")]
    pub synthetic_days: Option<usize>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub scenario: ScenarioSource,

    #[command(flatten)]
    pub prices: PriceSource,

    /// Seed for synthetic prices.
    #[arg(long, default_value_t = 42, env = "DISPATCH_SIM_SEED")]
    pub seed: u64,

    /// Write dispatch, battery, tolling and KPI files into this directory.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Print every dispatch interval.
    #[arg(long)]
    pub show_intervals: bool,
}

#[derive(Debug, Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub scenario: ScenarioSource,

    #[command(flatten)]
    pub prices: PriceSource,

    #[arg(long, default_value_t = 42, env = "DISPATCH_SIM_SEED")]
    pub seed: u64,

    /// First parameter (target-margin, min-load, capacity, ramp-limit, break-even).
    #[arg(long)]
    pub x: SweepParam,

    /// Range for the first parameter as start:stop:step.
    #[arg(long, allow_hyphen_values = true)]
    pub x_range: SweepRange,

    /// Second parameter.
    #[arg(long)]
    pub y: SweepParam,

    /// Range for the second parameter as start:stop:step.
    #[arg(long, allow_hyphen_values = true)]
    pub y_range: SweepRange,

    /// Write the grid as CSV instead of printing it.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PortfolioArgs {
    #[command(flatten)]
    pub scenario: ScenarioSource,

    /// Price CSV files; each one is run separately.
    #[arg(required = true, value_name = "CSV")]
    pub files: Vec<PathBuf>,

    /// Write the summary as CSV instead of printing it.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}
