//! Demand, energy and fixed cost of one month at one load factor.

use super::types::{AllocationSource, DemandInputSet, LoadFactorRow, Notice, PeriodCharge};
use crate::error::ConfigError;
use crate::tariff::{CalendarContext, Tariff};

/// Inputs that stay fixed across every evaluation of a sweep.
#[derive(Debug, Clone, Copy)]
pub struct CostInputs<'a> {
    pub tariff: &'a Tariff,
    /// Facility peak demand (kW).
    pub peak_demand_kw: f64,
    pub demand: &'a DemandInputSet,
}

/// One evaluated row and the notices raised while pricing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub row: LoadFactorRow,
    pub notices: Vec<Notice>,
}

/// Demand charges billed in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandCharges {
    /// Every TOU demand period; unbilled periods carry zero cost.
    pub tou: Vec<PeriodCharge>,
    /// The month's flat-demand tier, if any.
    pub flat: Vec<PeriodCharge>,
    /// Set when the flat demand was raised to the highest billed TOU demand.
    pub substitution: Option<Notice>,
}

impl DemandCharges {
    pub fn total(&self) -> f64 {
        self.tou.iter().chain(&self.flat).map(|c| c.cost).sum()
    }
}

/// Prices the demand side of `month`.
///
/// Demand is billed against the single highest measured demand, so a flat
/// demand entered below the highest TOU demand billed this month is raised to
/// it.
///
/// # Errors
///
/// Returns a `ConfigError` if `month` is not in `0..12`.
pub fn demand_charges(
    tariff: &Tariff,
    demand: &DemandInputSet,
    month: usize,
) -> Result<DemandCharges, ConfigError> {
    let billed = tariff.billed_demand_periods(month)?;
    let tou = tariff
        .demand_rates
        .iter()
        .enumerate()
        .map(|(period, tier)| {
            let kw = demand.tou(period).unwrap_or(0.0);
            let is_billed = billed.contains(period);
            PeriodCharge {
                period,
                label: tier.label.clone(),
                quantity: kw,
                rate: tier.total_rate(),
                cost: if is_billed { kw * tier.total_rate() } else { 0.0 },
                months: u32::from(is_billed),
            }
        })
        .collect();

    let mut substitution = None;
    let flat = tariff
        .flat_demand_tier(month)?
        .map(|tier| {
            let kw = match (demand.flat_kw, demand.max_billed_kw(&billed)) {
                (Some(entered), Some(highest)) if tariff.has_tou_demand() && entered < highest => {
                    substitution = Some(Notice::FlatDemandSubstituted {
                        entered_kw: entered,
                        used_kw: highest,
                    });
                    highest
                }
                (Some(entered), _) => entered,
                (None, _) => 0.0,
            };
            let rate = tariff.flat_demand_rates.total_rate(tier);
            PeriodCharge {
                period: tier,
                label: tariff.flat_demand_rates.label(tier),
                quantity: kw,
                rate,
                cost: kw * rate,
                months: 1,
            }
        })
        .into_iter()
        .collect();

    Ok(DemandCharges {
        tou,
        flat,
        substitution,
    })
}

/// Prices one month at `load_factor` with the given energy `allocation`.
///
/// `allocation` is in percent, indexed by energy period; periods beyond its
/// length get no energy but are still listed with their rate.
///
/// # Errors
///
/// Returns a `ConfigError` if `month` is not in `0..12`.
pub fn evaluate(
    load_factor: f64,
    month: usize,
    calendar: &CalendarContext,
    allocation: &[f64],
    source: AllocationSource,
    inputs: &CostInputs<'_>,
) -> Result<Evaluation, ConfigError> {
    let tariff = inputs.tariff;
    let average_load_kw = load_factor * inputs.peak_demand_kw;
    let total_energy_kwh = average_load_kw * f64::from(calendar.total_hours);

    let demand = demand_charges(tariff, inputs.demand, month)?;
    let demand_cost = demand.total();

    let active = tariff.energy_schedule.active_periods(month)?;
    let energy: Vec<PeriodCharge> = tariff
        .energy_rates
        .iter()
        .enumerate()
        .map(|(period, tier)| {
            let share = allocation.get(period).copied().unwrap_or(0.0);
            let kwh = share / 100.0 * total_energy_kwh;
            PeriodCharge {
                period,
                label: tier.label.clone(),
                quantity: kwh,
                rate: tier.total_rate(),
                cost: kwh * tier.total_rate(),
                months: u32::from(active.contains(period)),
            }
        })
        .collect();
    let energy_cost = energy.iter().map(|c| c.cost).sum::<f64>();

    let fixed_cost = tariff.fixed_charge;
    let total_cost = demand_cost + energy_cost + fixed_cost;
    let effective_rate = (total_energy_kwh > 0.0).then(|| total_cost / total_energy_kwh);

    Ok(Evaluation {
        row: LoadFactorRow {
            load_factor,
            average_load_kw,
            total_energy_kwh,
            demand_cost,
            energy_cost,
            fixed_cost,
            total_cost,
            effective_rate,
            allocation: source,
            energy,
            demand: demand.tou,
            flat_demand: demand.flat,
        },
        notices: demand.substitution.into_iter().collect(),
    })
}
