//! Twelve-month evaluation per load factor, summed into annual rows.

use tracing::{debug, instrument};

use super::cost::{CostInputs, evaluate};
use super::feasibility::{FeasibilityLimit, allocation_source, max_valid_load_factor};
use super::sweep::generate_load_factors;
use super::types::{
    AllocationSource, EnergyAllocation, LoadFactorRow, Notice, PeriodCharge, SweepInputs,
    SweepResult, push_notice,
};
use crate::error::ConfigError;
use crate::tariff::calendar::year_context;
use crate::tariff::{CalendarContext, HourFractions, MONTHS, RateTier, Tariff};

/// Per-month inputs that do not depend on the load factor.
struct MonthPlan {
    month: usize,
    calendar: CalendarContext,
    hour_fractions: HourFractions,
    /// User allocation restricted to this month's active periods.
    user_allocation: Option<EnergyAllocation>,
}

/// Sweeps load factor over a full year.
///
/// The feasibility bound comes from annual hour fractions. Each month is then
/// priced with the load factor held fixed, the user allocation restricted to
/// that month's active periods, and that month's flat-demand tier. Demand
/// charges recur in every month they are billed.
///
/// # Errors
///
/// Returns a `ConfigError` if the inputs fail validation.
#[instrument(skip(inputs), fields(tariff = %inputs.tariff.name))]
pub fn compute_annual_sweep(inputs: &SweepInputs) -> Result<SweepResult, ConfigError> {
    inputs.validate()?;

    let tariff = &inputs.tariff;
    let period_count = tariff.energy_rates.len();
    let year = year_context(inputs.reference_year)?;
    let hour_fractions = tariff
        .energy_schedule
        .annual_hour_fractions(&year, period_count);
    let feasibility = max_valid_load_factor(inputs.allocation.as_slice(), hour_fractions.as_slice());
    debug!(
        max_load_factor = feasibility.max_load_factor,
        limit = ?feasibility.limit,
        "annual feasibility resolved"
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

    let plans = year
        .iter()
        .enumerate()
        .map(|(month, calendar)| {
            let active = tariff.energy_schedule.active_periods(month)?;
            Ok(MonthPlan {
                month,
                calendar: *calendar,
                hour_fractions: tariff
                    .energy_schedule
                    .hour_fractions(calendar, month, period_count)?,
                user_allocation: inputs.allocation.restricted_to(&active),
            })
        })
        .collect::<Result<Vec<MonthPlan>, ConfigError>>()?;

    let cost_inputs = CostInputs {
        tariff,
        peak_demand_kw: inputs.peak_demand_kw,
        demand: &inputs.demand,
    };
    let load_factors = generate_load_factors(feasibility.max_load_factor);
    let mut rows = Vec::with_capacity(load_factors.len());
    for load_factor in load_factors {
        let source = allocation_source(load_factor, feasibility.max_load_factor, inputs.tolerance);
        let mut annual = AnnualAccumulator::new(tariff);
        for plan in &plans {
            let allocation = match (source, &plan.user_allocation) {
                (AllocationSource::User, Some(user)) => user.as_slice(),
                (AllocationSource::User, None) => {
                    push_notice(
                        &mut notices,
                        Notice::MonthWithoutAllocation { month: plan.month },
                    );
                    plan.hour_fractions.as_slice()
                }
                (AllocationSource::Forced, _) => plan.hour_fractions.as_slice(),
            };
            let evaluation = evaluate(
                load_factor,
                plan.month,
                &plan.calendar,
                allocation,
                source,
                &cost_inputs,
            )?;
            for notice in evaluation.notices {
                push_notice(&mut notices, notice);
            }
            annual.add(&evaluation.row);
        }
        rows.push(annual.finish(load_factor, inputs.peak_demand_kw, source));
    }
    debug!(points = rows.len(), "annual sweep complete");

    Ok(SweepResult {
        rows,
        feasibility,
        hour_fractions,
        notices,
    })
}

/// Running totals of twelve monthly rows.
struct AnnualAccumulator {
    months: usize,
    total_energy_kwh: f64,
    fixed_cost: f64,
    energy: Vec<PeriodCharge>,
    demand: Vec<PeriodCharge>,
    flat_demand: Vec<PeriodCharge>,
}

impl AnnualAccumulator {
    fn new(tariff: &Tariff) -> Self {
        let empty = |(period, tier): (usize, &RateTier)| PeriodCharge {
            period,
            label: tier.label.clone(),
            quantity: 0.0,
            rate: tier.total_rate(),
            cost: 0.0,
            months: 0,
        };
        Self {
            months: 0,
            total_energy_kwh: 0.0,
            fixed_cost: 0.0,
            energy: tariff.energy_rates.iter().enumerate().map(empty).collect(),
            demand: tariff.demand_rates.iter().enumerate().map(empty).collect(),
            flat_demand: tariff.flat_demand_rates.iter().enumerate().map(empty).collect(),
        }
    }

    fn add(&mut self, month: &LoadFactorRow) {
        self.months += 1;
        self.total_energy_kwh += month.total_energy_kwh;
        self.fixed_cost += month.fixed_cost;
        for charge in &month.energy {
            if let Some(acc) = self.energy.get_mut(charge.period) {
                acc.quantity += charge.quantity;
                acc.cost += charge.cost;
                acc.months += charge.months;
            }
        }
        // Demand quantities are monthly kW, so they are carried rather than summed.
        for (totals, charges) in [
            (&mut self.demand, &month.demand),
            (&mut self.flat_demand, &month.flat_demand),
        ] {
            for charge in charges.iter().filter(|c| c.months > 0) {
                if let Some(acc) = totals.get_mut(charge.period) {
                    acc.quantity = acc.quantity.max(charge.quantity);
                    acc.cost += charge.cost;
                    acc.months += charge.months;
                }
            }
        }
    }

    fn finish(self, load_factor: f64, peak_demand_kw: f64, source: AllocationSource) -> LoadFactorRow {
        debug_assert_eq!(self.months, MONTHS);
        let billed = |charges: Vec<PeriodCharge>| -> Vec<PeriodCharge> {
            charges.into_iter().filter(|c| c.months > 0).collect()
        };
        let demand = billed(self.demand);
        let flat_demand = billed(self.flat_demand);

        let energy_cost = self.energy.iter().map(|c| c.cost).sum::<f64>();
        let demand_cost = demand.iter().chain(&flat_demand).map(|c| c.cost).sum::<f64>();
        let total_cost = demand_cost + energy_cost + self.fixed_cost;
        let effective_rate =
            (self.total_energy_kwh > 0.0).then(|| total_cost / self.total_energy_kwh);

        LoadFactorRow {
            load_factor,
            average_load_kw: load_factor * peak_demand_kw,
            total_energy_kwh: self.total_energy_kwh,
            demand_cost,
            energy_cost,
            fixed_cost: self.fixed_cost,
            total_cost,
            effective_rate,
            allocation: source,
            energy: self.energy,
            demand,
            flat_demand,
        }
    }
}
