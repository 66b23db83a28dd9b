//! Load-factor sweep engine: feasibility, pricing, and aggregation.

pub mod annual;
pub mod breakdown;
pub mod cost;
pub mod feasibility;
pub mod summary;
pub mod sweep;
pub mod types;

pub use annual::compute_annual_sweep;
pub use breakdown::{BreakdownTable, comprehensive_breakdown};
pub use feasibility::{Feasibility, FeasibilityLimit, LOAD_FACTOR_TOLERANCE};
pub use summary::SweepSummary;
pub use sweep::{compute_monthly_sweep, generate_load_factors};
pub use types::{
    AllocationSource, DemandInputSet, EnergyAllocation, LoadFactorRow, Notice, PeriodCharge,
    SweepInputs, SweepResult,
};

use crate::error::ConfigError;

/// Time window a sweep covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// One 0-based month (0 = January).
    Month(usize),
    /// All twelve months aggregated.
    Annual,
}

/// Runs the sweep selected by `mode`.
///
/// # Errors
///
/// Returns a `ConfigError` if the inputs fail validation.
pub fn run_sweep(mode: SweepMode, inputs: &SweepInputs) -> Result<SweepResult, ConfigError> {
    match mode {
        SweepMode::Month(month) => compute_monthly_sweep(month, inputs),
        SweepMode::Annual => compute_annual_sweep(inputs),
    }
}
