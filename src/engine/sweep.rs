//! Load-factor sequence generation and the single-month sweep.

use tracing::{debug, instrument};

use super::cost::{CostInputs, evaluate};
use super::feasibility::{FeasibilityLimit, effective_allocation, max_valid_load_factor};
use super::types::{Notice, SweepInputs, SweepResult, push_notice};
use crate::error::ConfigError;
use crate::tariff::calendar::{check_month, month_context};

/// Bounds at or above this sweep the full 1–100% range.
pub const FULL_SWEEP_THRESHOLD: f64 = 0.995;

/// Load factors to evaluate for a feasibility bound of `max_valid`.
///
/// Whole percents from 1% up to the bound, then 100% (priced with the forced
/// allocation) if the bound stops short of it.
///
/// # Examples
///
/// ```
/// use lf_rate::engine::sweep::generate_load_factors;
///
/// let lfs = generate_load_factors(0.034);
/// assert_eq!(lfs, vec![0.01, 0.02, 0.03, 1.0]);
/// assert_eq!(generate_load_factors(1.0).len(), 100);
/// assert_eq!(generate_load_factors(0.0), vec![1.0]);
/// ```
pub fn generate_load_factors(max_valid: f64) -> Vec<f64> {
    if max_valid >= FULL_SWEEP_THRESHOLD {
        return (1..=100).map(percent).collect();
    }
    // Nudge so that e.g. 0.29 * 100 = 28.999... still yields 29.
    let ceiling = (max_valid.max(0.0) * 100.0 + 1e-9).floor() as u32;
    let mut load_factors: Vec<f64> = (1..=ceiling).map(percent).collect();
    load_factors.push(1.0);
    load_factors
}

fn percent(p: u32) -> f64 {
    f64::from(p) / 100.0
}

/// Sweeps load factor over one 0-based `month`.
///
/// # Errors
///
/// Returns a `ConfigError` if the inputs fail validation or `month` is out of
/// range.
#[instrument(skip(inputs), fields(tariff = %inputs.tariff.name))]
pub fn compute_monthly_sweep(month: usize, inputs: &SweepInputs) -> Result<SweepResult, ConfigError> {
    check_month(month)?;
    inputs.validate()?;

    let tariff = &inputs.tariff;
    let calendar = month_context(month, inputs.reference_year)?;
    let hour_fractions =
        tariff
            .energy_schedule
            .hour_fractions(&calendar, month, tariff.energy_rates.len())?;
    let feasibility = max_valid_load_factor(inputs.allocation.as_slice(), hour_fractions.as_slice());
    debug!(
        max_load_factor = feasibility.max_load_factor,
        limit = ?feasibility.limit,
        "feasibility resolved"
    );

    let mut notices = Vec::new();
    if let FeasibilityLimit::ZeroHours { period } = feasibility.limit {
        notices.push(Notice::InfeasibleAllocation {
            period,
            label: tariff.energy_rates.label(period),
        });
    }
    if inputs.demand.is_unset() {
        notices.push(Notice::NoDemandEntered);
    }

    let cost_inputs = CostInputs {
        tariff,
        peak_demand_kw: inputs.peak_demand_kw,
        demand: &inputs.demand,
    };
    let load_factors = generate_load_factors(feasibility.max_load_factor);
    let mut rows = Vec::with_capacity(load_factors.len());
    for load_factor in load_factors {
        let (source, allocation) = effective_allocation(
            load_factor,
            feasibility.max_load_factor,
            inputs.allocation.as_slice(),
            hour_fractions.as_slice(),
            inputs.tolerance,
        );
        let evaluation = evaluate(load_factor, month, &calendar, allocation, source, &cost_inputs)?;
        for notice in evaluation.notices {
            push_notice(&mut notices, notice);
        }
        rows.push(evaluation.row);
    }
    debug!(points = rows.len(), "monthly sweep complete");

    Ok(SweepResult {
        rows,
        feasibility,
        hour_fractions,
        notices,
    })
}
