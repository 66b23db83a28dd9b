//! Command-line arguments for the sweep binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::Level;

use crate::engine::SweepMode;

/// Effective-rate sweep of a time-of-use tariff across load factors.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// TOML scenario file.
    #[clap(long, env = "LF_RATE_SCENARIO", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in scenario (`three_period` or `seasonal_demand`).
    #[clap(long, default_value = "three_period")]
    pub preset: String,

    /// Calendar month to sweep, 1 = January.
    #[clap(
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u8).range(1..=12),
        conflicts_with = "annual"
    )]
    pub month: u8,

    /// Sweep all twelve months and aggregate.
    #[clap(long)]
    pub annual: bool,

    /// Override the scenario's reference year.
    #[clap(long = "reference-year", env = "LF_RATE_REFERENCE_YEAR")]
    pub reference_year: Option<i32>,

    /// Write the sweep rows as CSV.
    #[clap(long = "csv-out")]
    pub csv_out: Option<PathBuf>,

    /// Write the comprehensive per-period breakdown as CSV.
    #[clap(long = "breakdown-out")]
    pub breakdown_out: Option<PathBuf>,

    /// Increase log verbosity (repeat for more).
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn mode(&self) -> SweepMode {
        if self.annual {
            SweepMode::Annual
        } else {
            SweepMode::Month(usize::from(self.month) - 1)
        }
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
