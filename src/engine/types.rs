//! Engine inputs, result rows, and soft notices.

use std::fmt;

use serde::Serialize;

use super::feasibility::{Feasibility, LOAD_FACTOR_TOLERANCE};
use crate::error::ConfigError;
use crate::tariff::{ActivePeriodSet, DEFAULT_REFERENCE_YEAR, HourFractions, Tariff};

/// Allowed deviation of an allocation's total from 100, in percentage points.
pub const ALLOCATION_TOLERANCE_PCT: f64 = 0.1;

/// User-asserted split of energy across energy periods, in percent.
///
/// Indexed by energy period. A valid allocation sums to 100.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyAllocation(Vec<f64>);

impl EnergyAllocation {
    pub fn new(shares: Vec<f64>) -> Self {
        Self(shares)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, period: usize) -> f64 {
        self.0.get(period).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Checks shape, range and total against `period_count` energy periods.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a wrong length, a share outside 0–100, or a
    /// total further than [`ALLOCATION_TOLERANCE_PCT`] from 100.
    pub fn validate(&self, period_count: usize) -> Result<(), ConfigError> {
        const FIELD: &str = "load.energy_allocation";
        if self.0.len() != period_count {
            return Err(ConfigError::new(
                FIELD,
                format!(
                    "expected one share per energy period ({period_count}), got {}",
                    self.0.len()
                ),
            ));
        }
        if let Some((i, share)) = self
            .0
            .iter()
            .enumerate()
            .find(|(_, s)| !(0.0..=100.0).contains(*s))
        {
            return Err(ConfigError::new(
                format!("{FIELD}[{i}]"),
                format!("must be in [0, 100], got {share}"),
            ));
        }
        let total = self.total();
        if (total - 100.0).abs() > ALLOCATION_TOLERANCE_PCT {
            return Err(ConfigError::new(
                FIELD,
                format!("shares must sum to 100, got {total:.3}"),
            ));
        }
        Ok(())
    }

    /// Keeps only `active` periods and rescales them to sum to 100.
    ///
    /// Returns `None` when nothing was allocated to any active period.
    pub fn restricted_to(&self, active: &ActivePeriodSet) -> Option<Self> {
        let kept: Vec<f64> = self
            .0
            .iter()
            .enumerate()
            .map(|(p, &s)| if active.contains(p) { s } else { 0.0 })
            .collect();
        let total: f64 = kept.iter().sum();
        (total > 0.0).then(|| Self(kept.into_iter().map(|s| s / total * 100.0).collect()))
    }
}

impl From<HourFractions> for EnergyAllocation {
    fn from(fractions: HourFractions) -> Self {
        Self(fractions.as_slice().to_vec())
    }
}

/// Demand values entered by the user.
///
/// `None` means "not entered", which is reported differently from an entered
/// zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandInputSet {
    /// kW per TOU demand period.
    pub tou_kw: Vec<Option<f64>>,
    /// kW billed against the month's flat-demand tier.
    pub flat_kw: Option<f64>,
}

impl DemandInputSet {
    /// All TOU periods entered, optional flat demand.
    pub fn new(tou_kw: &[f64], flat_kw: Option<f64>) -> Self {
        Self {
            tou_kw: tou_kw.iter().copied().map(Some).collect(),
            flat_kw,
        }
    }

    /// Entered kW of TOU `period`.
    pub fn tou(&self, period: usize) -> Option<f64> {
        self.tou_kw.get(period).copied().flatten()
    }

    /// Highest entered TOU demand among the `billed` periods.
    pub fn max_billed_kw(&self, billed: &ActivePeriodSet) -> Option<f64> {
        billed.iter().filter_map(|period| self.tou(period)).reduce(f64::max)
    }

    /// True when no demand value at all was entered.
    pub fn is_unset(&self) -> bool {
        self.flat_kw.is_none() && self.tou_kw.iter().all(Option::is_none)
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` for more values than `period_count` demand
    /// periods, or for a negative or non-finite kW.
    pub fn validate(&self, period_count: usize) -> Result<(), ConfigError> {
        if self.tou_kw.len() > period_count {
            return Err(ConfigError::new(
                "load.demand_kw",
                format!(
                    "{} value(s) given for {period_count} demand period(s)",
                    self.tou_kw.len()
                ),
            ));
        }
        let entries = self
            .tou_kw
            .iter()
            .enumerate()
            .filter_map(|(i, kw)| kw.map(|kw| (format!("load.demand_kw[{i}]"), kw)))
            .chain(self.flat_kw.map(|kw| ("load.flat_demand_kw".to_string(), kw)));
        for (field, kw) in entries {
            if !kw.is_finite() || kw < 0.0 {
                return Err(ConfigError::new(field, format!("must be >= 0, got {kw}")));
            }
        }
        Ok(())
    }
}

/// Everything one sweep needs, owned by the caller and read-only to the engine.
#[derive(Debug, Clone)]
pub struct SweepInputs {
    pub tariff: Tariff,
    /// Facility peak demand (kW).
    pub peak_demand_kw: f64,
    pub demand: DemandInputSet,
    pub allocation: EnergyAllocation,
    /// Year whose calendar sets weekday/weekend counts.
    pub reference_year: i32,
    /// Slack when comparing a requested load factor with the feasibility bound.
    pub tolerance: f64,
}

impl SweepInputs {
    pub fn new(
        tariff: Tariff,
        peak_demand_kw: f64,
        demand: DemandInputSet,
        allocation: EnergyAllocation,
    ) -> Self {
        Self {
            tariff,
            peak_demand_kw,
            demand,
            allocation,
            reference_year: DEFAULT_REFERENCE_YEAR,
            tolerance: LOAD_FACTOR_TOLERANCE,
        }
    }

    /// Re-checks everything the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tariff.validate()?;
        if !self.peak_demand_kw.is_finite() || self.peak_demand_kw <= 0.0 {
            return Err(ConfigError::new(
                "load.peak_demand_kw",
                format!("must be > 0, got {}", self.peak_demand_kw),
            ));
        }
        if !(0.0..0.05).contains(&self.tolerance) {
            return Err(ConfigError::new(
                "calculation.tolerance",
                format!("must be in [0, 0.05), got {}", self.tolerance),
            ));
        }
        self.allocation.validate(self.tariff.energy_rates.len())?;
        self.demand.validate(self.tariff.demand_rates.len())
    }
}

/// Which energy split a row was priced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationSource {
    /// The user's allocation (load factor within the feasibility bound).
    User,
    /// Hour-fraction allocation (facility running across all active periods).
    Forced,
}

impl fmt::Display for AllocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Forced => "forced",
        })
    }
}

/// Quantity, price and cost of one period in one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodCharge {
    /// Period (or flat-demand tier) index.
    pub period: usize,
    pub label: String,
    /// kWh for energy, kW for demand.
    pub quantity: f64,
    pub rate: f64,
    pub cost: f64,
    /// Months of the evaluated window in which the period was billed.
    pub months: u32,
}

/// Result of evaluating one load factor over a month or a year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadFactorRow {
    /// Average load over peak demand (0–1).
    pub load_factor: f64,
    pub average_load_kw: f64,
    pub total_energy_kwh: f64,
    pub demand_cost: f64,
    pub energy_cost: f64,
    pub fixed_cost: f64,
    pub total_cost: f64,
    /// `total_cost / total_energy_kwh`; `None` when no energy was consumed.
    pub effective_rate: Option<f64>,
    pub allocation: AllocationSource,
    pub energy: Vec<PeriodCharge>,
    pub demand: Vec<PeriodCharge>,
    pub flat_demand: Vec<PeriodCharge>,
}

impl fmt::Display for LoadFactorRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LF={:>5.1}% | avg={:>9.2} kW  energy={:>12.1} kWh | demand=${:>10.2}  \
             energy=${:>11.2}  fixed=${:>8.2}  total=${:>11.2} | ",
            self.load_factor * 100.0,
            self.average_load_kw,
            self.total_energy_kwh,
            self.demand_cost,
            self.energy_cost,
            self.fixed_cost,
            self.total_cost,
        )?;
        match self.effective_rate {
            Some(rate) => write!(f, "rate={rate:.5} $/kWh")?,
            None => write!(f, "rate=N/A")?,
        }
        write!(f, " [{}]", self.allocation)
    }
}

/// Soft conditions surfaced alongside a result instead of aborting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Energy was allocated to a period with no hours in the window, so only
    /// the forced 100% load factor is evaluated.
    InfeasibleAllocation { period: usize, label: String },
    /// No TOU or flat demand value was entered; demand cost is zero because
    /// it is unset.
    NoDemandEntered,
    /// The entered flat demand was below the highest TOU demand, which was
    /// billed instead.
    FlatDemandSubstituted { entered_kw: f64, used_kw: f64 },
    /// The user allocated nothing to any period active in this month; the
    /// month's hour fractions were used.
    MonthWithoutAllocation { month: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InfeasibleAllocation { period, label } => write!(
                f,
                "energy allocated to \"{label}\" (period {}) which has no hours in this window; \
                 only the 100% load factor can be evaluated",
                period + 1
            ),
            Self::NoDemandEntered => {
                write!(f, "no demand values entered; demand cost is zero because it is unset")
            }
            Self::FlatDemandSubstituted {
                entered_kw,
                used_kw,
            } => write!(
                f,
                "flat demand {entered_kw:.2} kW is below the highest TOU demand; \
                 billed {used_kw:.2} kW instead"
            ),
            Self::MonthWithoutAllocation { month } => write!(
                f,
                "month {} has no allocated period active; hour fractions used instead",
                month + 1
            ),
        }
    }
}

/// Rows of one sweep plus how they were derived.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub rows: Vec<LoadFactorRow>,
    pub feasibility: Feasibility,
    /// Hour fractions used for the feasibility bound (monthly or annual).
    pub hour_fractions: HourFractions,
    pub notices: Vec<Notice>,
}

pub(crate) fn push_notice(notices: &mut Vec<Notice>, notice: Notice) {
    if !notices.contains(&notice) {
        notices.push(notice);
    }
}
