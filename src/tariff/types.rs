//! The tariff as consumed by the engine.

use super::calendar::{MONTHS, check_month};
use super::rates::RateTierStructure;
use super::schedule::{ActivePeriodSet, ScheduleMatrix};
use crate::error::ConfigError;

/// Complete rate structure of one utility tariff.
///
/// Energy periods are always present. TOU demand periods, flat-demand tiers
/// and the fixed charge are optional (empty structure / zero).
#[derive(Debug, Clone)]
pub struct Tariff {
    /// Tariff display name.
    pub name: String,
    /// Energy rates ($/kWh) indexed by energy period.
    pub energy_rates: RateTierStructure,
    /// Energy period per hour of each month.
    pub energy_schedule: ScheduleMatrix,
    /// Time-of-use demand rates ($/kW) indexed by demand period.
    pub demand_rates: RateTierStructure,
    /// Demand period per hour of each month. When absent, every TOU demand
    /// period is billed every month.
    pub demand_schedule: Option<ScheduleMatrix>,
    /// Flat (non-time-differentiated) demand rates ($/kW) indexed by tier.
    pub flat_demand_rates: RateTierStructure,
    /// Flat-demand tier applicable in each month.
    pub flat_demand_months: [usize; MONTHS],
    /// Monthly fixed customer charge ($).
    pub fixed_charge: f64,
}

impl Tariff {
    /// Tariff with energy charges only.
    pub fn energy_only(
        name: impl Into<String>,
        energy_rates: RateTierStructure,
        energy_schedule: ScheduleMatrix,
    ) -> Self {
        Self {
            name: name.into(),
            energy_rates,
            energy_schedule,
            demand_rates: RateTierStructure::default(),
            demand_schedule: None,
            flat_demand_rates: RateTierStructure::default(),
            flat_demand_months: [0; MONTHS],
            fixed_charge: 0.0,
        }
    }

    pub fn has_tou_demand(&self) -> bool {
        !self.demand_rates.is_empty()
    }

    pub fn has_flat_demand(&self) -> bool {
        !self.flat_demand_rates.is_empty()
    }

    /// Flat-demand tier billed in `month`, if the tariff has flat demand.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `month` is not in `0..12`.
    pub fn flat_demand_tier(&self, month: usize) -> Result<Option<usize>, ConfigError> {
        check_month(month)?;
        Ok(self.has_flat_demand().then(|| self.flat_demand_months[month]))
    }

    /// TOU demand periods billed in `month`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `month` is not in `0..12`.
    pub fn billed_demand_periods(&self, month: usize) -> Result<ActivePeriodSet, ConfigError> {
        check_month(month)?;
        Ok(match &self.demand_schedule {
            _ if !self.has_tou_demand() => ActivePeriodSet::default(),
            Some(schedule) => schedule.active_periods(month)?,
            None => (0..self.demand_rates.len()).collect(),
        })
    }

    /// Checks rates, schedule indices and the flat-demand month map.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.energy_rates.is_empty() {
            return Err(ConfigError::new(
                "tariff.energy_periods",
                "at least one energy period is required",
            ));
        }
        self.energy_rates.validate("tariff.energy_periods")?;
        self.demand_rates.validate("tariff.demand_periods")?;
        self.flat_demand_rates.validate("tariff.flat_demand_tiers")?;

        self.energy_schedule
            .validate_indices("tariff.energy_schedule", self.energy_rates.len())?;
        if let Some(schedule) = &self.demand_schedule {
            schedule.validate_indices("tariff.demand_schedule", self.demand_rates.len())?;
        }

        if self.has_flat_demand() {
            let tiers = self.flat_demand_rates.len();
            if let Some((month, tier)) = self
                .flat_demand_months
                .iter()
                .enumerate()
                .find(|(_, t)| **t >= tiers)
            {
                return Err(ConfigError::new(
                    format!("tariff.flat_demand_months[{month}]"),
                    format!("tier index {tier} out of range ({tiers} tier(s) defined)"),
                ));
            }
        }

        if !self.fixed_charge.is_finite() || self.fixed_charge < 0.0 {
            return Err(ConfigError::new(
                "tariff.fixed_charge",
                "must be a finite amount >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::rates::RateTier;

    fn flat_energy() -> Tariff {
        Tariff::energy_only(
            "Flat",
            RateTierStructure::new(vec![RateTier::new("All hours", 0.12, 0.0)]),
            ScheduleMatrix::uniform(0),
        )
    }

    #[test]
    fn energy_only_is_valid() {
        assert!(flat_energy().validate().is_ok());
    }

    #[test]
    fn missing_energy_periods_rejected() {
        let mut tariff = flat_energy();
        tariff.energy_rates = RateTierStructure::default();
        let err = tariff.validate().unwrap_err();
        assert_eq!(err.field, "tariff.energy_periods");
    }

    #[test]
    fn demand_periods_billed_every_month_without_schedule() {
        let mut tariff = flat_energy();
        tariff.demand_rates = RateTierStructure::new(vec![
            RateTier::new("Peak", 12.0, 0.0),
            RateTier::new("Off-peak", 3.0, 0.0),
        ]);
        let billed: Vec<usize> = tariff.billed_demand_periods(5).unwrap().iter().collect();
        assert_eq!(billed, vec![0, 1]);
    }

    #[test]
    fn demand_schedule_limits_billed_periods() {
        let mut tariff = flat_energy();
        tariff.demand_rates = RateTierStructure::new(vec![
            RateTier::new("Winter", 8.0, 0.0),
            RateTier::new("Summer", 15.0, 0.0),
        ]);
        tariff.demand_schedule = Some(ScheduleMatrix::uniform(1));
        let billed: Vec<usize> = tariff.billed_demand_periods(0).unwrap().iter().collect();
        assert_eq!(billed, vec![1]);
    }

    #[test]
    fn flat_month_map_checked() {
        let mut tariff = flat_energy();
        tariff.flat_demand_rates = RateTierStructure::new(vec![RateTier::new("All", 5.0, 0.0)]);
        tariff.flat_demand_months[7] = 1;
        let err = tariff.validate().unwrap_err();
        assert_eq!(err.field, "tariff.flat_demand_months[7]");
    }

    #[test]
    fn no_flat_tier_without_flat_demand() {
        assert_eq!(flat_energy().flat_demand_tier(3).unwrap(), None);
    }

    #[test]
    fn month_past_december_is_rejected() {
        let mut tariff = flat_energy();
        tariff.demand_rates = RateTierStructure::new(vec![RateTier::new("Peak", 12.0, 0.0)]);
        tariff.flat_demand_rates = RateTierStructure::new(vec![RateTier::new("All", 5.0, 0.0)]);
        assert_eq!(tariff.flat_demand_tier(11).unwrap(), Some(0));
        assert_eq!(tariff.flat_demand_tier(12).unwrap_err().field, "month");
        assert_eq!(tariff.billed_demand_periods(12).unwrap_err().field, "month");
    }
}
