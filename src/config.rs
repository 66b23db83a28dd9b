//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::ops::Range;
use std::path::Path;

use serde::Deserialize;

use crate::engine::feasibility::LOAD_FACTOR_TOLERANCE;
use crate::engine::types::{DemandInputSet, EnergyAllocation, SweepInputs};
use crate::error::ConfigError;
use crate::tariff::calendar::year_context;
use crate::tariff::{
    DEFAULT_REFERENCE_YEAR, HOURS_PER_DAY, MONTHS, RateTier, RateTierStructure, ScheduleMatrix,
    Tariff,
};

/// Top-level scenario configuration parsed from TOML.
///
/// `[tariff]` and `[load]` are required; `[calculation]` falls back to its
/// defaults. Load from TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::from_preset`] for a built-in scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Calendar and tolerance parameters.
    #[serde(default)]
    pub calculation: CalculationConfig,
    /// Rate structure and schedules.
    pub tariff: TariffConfig,
    /// Facility load description.
    pub load: LoadConfig,
}

/// Calendar and tolerance parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculationConfig {
    /// Year whose calendar sets weekday/weekend day counts.
    pub reference_year: i32,
    /// Slack when comparing a load factor with the feasibility bound.
    pub tolerance: f64,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            reference_year: DEFAULT_REFERENCE_YEAR,
            tolerance: LOAD_FACTOR_TOLERANCE,
        }
    }
}

/// Weekday and weekend period grids.
///
/// Each grid is either 12 rows (one per month) of 24 period indices, or a
/// single row applied to every month.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    pub weekday: Vec<Vec<usize>>,
    pub weekend: Vec<Vec<usize>>,
}

impl ScheduleConfig {
    /// Same grid for every month.
    pub fn repeating(weekday: Vec<usize>, weekend: Vec<usize>) -> Self {
        Self {
            weekday: vec![weekday],
            weekend: vec![weekend],
        }
    }

    fn to_matrix(&self, field: &str) -> Result<ScheduleMatrix, ConfigError> {
        let expand = |rows: &[Vec<usize>]| -> Vec<Vec<usize>> {
            match rows {
                [row] => vec![row.clone(); MONTHS],
                _ => rows.to_vec(),
            }
        };
        ScheduleMatrix::from_rows(field, &expand(&self.weekday), &expand(&self.weekend))
    }
}

/// Tariff rate structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TariffConfig {
    /// Tariff display name.
    pub name: String,
    /// Monthly fixed customer charge ($).
    #[serde(default)]
    pub fixed_charge: f64,
    /// Energy rates ($/kWh), one per energy period.
    pub energy_periods: Vec<RateTier>,
    pub energy_schedule: ScheduleConfig,
    /// TOU demand rates ($/kW), one per demand period.
    #[serde(default)]
    pub demand_periods: Vec<RateTier>,
    /// When absent, every demand period is billed every month.
    #[serde(default)]
    pub demand_schedule: Option<ScheduleConfig>,
    /// Flat demand rates ($/kW), one per tier.
    #[serde(default)]
    pub flat_demand_tiers: Vec<RateTier>,
    /// Tier index per month (12 entries). Empty means tier 0 all year.
    #[serde(default)]
    pub flat_demand_months: Vec<usize>,
}

/// Facility load description.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadConfig {
    /// Facility peak demand (kW).
    pub peak_demand_kw: f64,
    /// Percent of energy per energy period (sums to 100).
    pub energy_allocation: Vec<f64>,
    /// Entered kW per TOU demand period. Shorter than the period list leaves
    /// the remaining periods unentered.
    #[serde(default)]
    pub demand_kw: Vec<f64>,
    /// Entered flat demand (kW).
    #[serde(default)]
    pub flat_demand_kw: Option<f64>,
}

/// `[(hours, period)]` painted over a period-0 day.
fn day_row(spans: &[(Range<usize>, usize)]) -> Vec<usize> {
    let mut row = vec![0; HOURS_PER_DAY];
    for (hours, period) in spans {
        for cell in &mut row[hours.clone()] {
            *cell = *period;
        }
    }
    row
}

impl ScenarioConfig {
    /// Returns the three-period preset: Off-peak/Mid-peak/On-peak energy,
    /// two TOU demand periods and a summer/winter flat demand charge.
    pub fn three_period() -> Self {
        let energy_weekday = day_row(&[(8..12, 1), (12..18, 2), (18..22, 1)]);
        let demand_weekday = day_row(&[(12..18, 1)]);
        Self {
            calculation: CalculationConfig::default(),
            tariff: TariffConfig {
                name: "Three-period TOU".to_string(),
                fixed_charge: 45.0,
                energy_periods: vec![
                    RateTier::new("Off-peak", 0.062, 0.004),
                    RateTier::new("Mid-peak", 0.089, 0.004),
                    RateTier::new("On-peak", 0.141, 0.004),
                ],
                energy_schedule: ScheduleConfig::repeating(energy_weekday, vec![0; HOURS_PER_DAY]),
                demand_periods: vec![
                    RateTier::new("Off-peak demand", 2.50, 0.0),
                    RateTier::new("On-peak demand", 12.00, 0.0),
                ],
                demand_schedule: Some(ScheduleConfig::repeating(
                    demand_weekday,
                    vec![0; HOURS_PER_DAY],
                )),
                flat_demand_tiers: vec![
                    RateTier::new("Summer", 6.25, 0.0),
                    RateTier::new("Winter", 4.10, 0.0),
                ],
                flat_demand_months: (0..MONTHS)
                    .map(|m| if (5..9).contains(&m) { 0 } else { 1 })
                    .collect(),
            },
            load: LoadConfig {
                peak_demand_kw: 500.0,
                energy_allocation: vec![60.0, 25.0, 15.0],
                demand_kw: vec![480.0, 450.0],
                flat_demand_kw: Some(500.0),
            },
        }
    }

    /// Returns the seasonal-demand preset: one energy period and a demand
    /// charge that is $8/kW January to June and $15/kW July to December.
    pub fn seasonal_demand() -> Self {
        let seasonal: Vec<Vec<usize>> = (0..MONTHS)
            .map(|m| vec![usize::from(m >= 6); HOURS_PER_DAY])
            .collect();
        Self {
            calculation: CalculationConfig::default(),
            tariff: TariffConfig {
                name: "Seasonal demand".to_string(),
                fixed_charge: 20.0,
                energy_periods: vec![RateTier::new("All hours", 0.11, 0.0)],
                energy_schedule: ScheduleConfig::repeating(
                    vec![0; HOURS_PER_DAY],
                    vec![0; HOURS_PER_DAY],
                ),
                demand_periods: vec![
                    RateTier::new("Winter demand", 8.0, 0.0),
                    RateTier::new("Summer demand", 15.0, 0.0),
                ],
                demand_schedule: Some(ScheduleConfig {
                    weekday: seasonal.clone(),
                    weekend: seasonal,
                }),
                flat_demand_tiers: Vec::new(),
                flat_demand_months: Vec::new(),
            },
            load: LoadConfig {
                peak_demand_kw: 200.0,
                energy_allocation: vec![100.0],
                demand_kw: vec![200.0, 200.0],
                flat_demand_kw: None,
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["three_period", "seasonal_demand"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "three_period" => Ok(Self::three_period()),
            "seasonal_demand" => Ok(Self::seasonal_demand()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Builds the engine tariff, checking grid shapes but not period indices.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a malformed schedule or month map.
    pub fn build_tariff(&self) -> Result<Tariff, ConfigError> {
        let t = &self.tariff;
        let flat_demand_months = match t.flat_demand_months.as_slice() {
            [] => [0; MONTHS],
            months => months.try_into().map_err(|_| {
                ConfigError::new(
                    "tariff.flat_demand_months",
                    format!("expected {MONTHS} entries, got {}", months.len()),
                )
            })?,
        };
        Ok(Tariff {
            name: t.name.clone(),
            energy_rates: t.energy_periods.iter().cloned().collect(),
            energy_schedule: t.energy_schedule.to_matrix("tariff.energy_schedule")?,
            demand_rates: RateTierStructure::new(t.demand_periods.clone()),
            demand_schedule: t
                .demand_schedule
                .as_ref()
                .map(|s| s.to_matrix("tariff.demand_schedule"))
                .transpose()?,
            flat_demand_rates: RateTierStructure::new(t.flat_demand_tiers.clone()),
            flat_demand_months,
            fixed_charge: t.fixed_charge,
        })
    }

    fn demand_inputs(&self) -> DemandInputSet {
        DemandInputSet::new(&self.load.demand_kw, self.load.flat_demand_kw)
    }

    /// Converts the scenario into engine inputs.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the tariff cannot be built. Value checks
    /// are left to [`ScenarioConfig::validate`] and the engine.
    pub fn to_inputs(&self) -> Result<SweepInputs, ConfigError> {
        let mut inputs = SweepInputs::new(
            self.build_tariff()?,
            self.load.peak_demand_kw,
            self.demand_inputs(),
            EnergyAllocation::new(self.load.energy_allocation.clone()),
        );
        inputs.reference_year = self.calculation.reference_year;
        inputs.tolerance = self.calculation.tolerance;
        Ok(inputs)
    }

    /// Validates all sections and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let c = &self.calculation;

        if let Err(e) = year_context(c.reference_year) {
            errors.push(e);
        }
        if !(0.0..0.05).contains(&c.tolerance) {
            errors.push(ConfigError::new(
                "calculation.tolerance",
                format!("must be in [0, 0.05), got {}", c.tolerance),
            ));
        }

        match self.build_tariff() {
            Ok(tariff) => {
                if let Err(e) = tariff.validate() {
                    errors.push(e);
                }
            }
            Err(e) => errors.push(e),
        }

        let l = &self.load;
        if !l.peak_demand_kw.is_finite() || l.peak_demand_kw <= 0.0 {
            errors.push(ConfigError::new(
                "load.peak_demand_kw",
                format!("must be > 0, got {}", l.peak_demand_kw),
            ));
        }
        if let Err(e) = EnergyAllocation::new(l.energy_allocation.clone())
            .validate(self.tariff.energy_periods.len())
        {
            errors.push(e);
        }
        if let Err(e) = self.demand_inputs().validate(self.tariff.demand_periods.len()) {
            errors.push(e);
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn three_period_preset_valid() {
        let cfg = ScenarioConfig::three_period();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "three_period should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
        assert_eq!(e.field, "preset");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
            let inputs = cfg.as_ref().map(ScenarioConfig::to_inputs);
            assert!(matches!(inputs, Ok(Ok(_))), "preset \"{name}\" should convert");
        }
    }

    #[test]
    fn three_period_schedule_layout() {
        let tariff = ScenarioConfig::three_period().build_tariff().unwrap();
        let weekday = tariff.energy_schedule.weekday(0).unwrap();
        assert_eq!(weekday[7], 0);
        assert_eq!(weekday[8], 1);
        assert_eq!(weekday[12], 2);
        assert_eq!(weekday[17], 2);
        assert_eq!(weekday[21], 1);
        assert_eq!(weekday[22], 0);
        assert_eq!(tariff.flat_demand_tier(5).unwrap(), Some(0));
        assert_eq!(tariff.flat_demand_tier(9).unwrap(), Some(1));
    }

    #[test]
    fn seasonal_demand_billing_split() {
        let tariff = ScenarioConfig::seasonal_demand().build_tariff().unwrap();
        assert!(tariff.billed_demand_periods(0).unwrap().contains(0));
        assert!(!tariff.billed_demand_periods(0).unwrap().contains(1));
        assert!(tariff.billed_demand_periods(11).unwrap().contains(1));
        assert!(!tariff.has_flat_demand());
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[calculation]
reference_year = 2023

[tariff]
name = "Two period"
fixed_charge = 12.5
energy_periods = [
    { label = "Off-peak", rate = 0.07 },
    { label = "Peak", rate = 0.18, adjustment = 0.01 },
]
energy_schedule.weekday = [[0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0]]
energy_schedule.weekend = [[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]]
demand_periods = [{ label = "Peak demand", rate = 11.0 }]

[load]
peak_demand_kw = 200.0
energy_allocation = [70.0, 30.0]
demand_kw = [180.0]
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
        assert_eq!(cfg.calculation.reference_year, 2023);
        assert_eq!(cfg.calculation.tolerance, LOAD_FACTOR_TOLERANCE);

        let inputs = cfg.to_inputs().unwrap();
        assert_eq!(inputs.reference_year, 2023);
        assert_relative_eq!(inputs.tariff.energy_rates.total_rate(1), 0.19);
        assert_eq!(inputs.tariff.energy_schedule.weekday(11).map(|row| row[9]), Some(1));
        assert_eq!(inputs.demand.tou(0), Some(180.0));
        assert_eq!(inputs.demand.flat_kw, None);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[calculation]
reference_year = 2024
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().field, "toml");
    }

    #[test]
    fn validation_catches_bad_allocation_sum() {
        let mut cfg = ScenarioConfig::three_period();
        cfg.load.energy_allocation = vec![60.0, 25.0, 10.0];
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "load.energy_allocation")
        );
    }

    #[test]
    fn validation_collects_every_section() {
        let mut cfg = ScenarioConfig::three_period();
        cfg.calculation.tolerance = 0.5;
        cfg.load.peak_demand_kw = 0.0;
        cfg.tariff.flat_demand_months = vec![0; 11];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "calculation.tolerance"));
        assert!(errors.iter().any(|e| e.field == "load.peak_demand_kw"));
        assert!(errors.iter().any(|e| e.field == "tariff.flat_demand_months"));
    }

    #[test]
    fn validation_catches_out_of_range_period() {
        let mut cfg = ScenarioConfig::three_period();
        cfg.tariff.energy_schedule.weekend = vec![vec![3; HOURS_PER_DAY]];
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field.starts_with("tariff.energy_schedule.weekend"))
        );
    }

    #[test]
    fn validation_catches_short_schedule() {
        let mut cfg = ScenarioConfig::seasonal_demand();
        cfg.tariff.energy_schedule.weekday = vec![vec![0; HOURS_PER_DAY]; 5];
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field.starts_with("tariff.energy_schedule.weekday"))
        );
        assert!(cfg.to_inputs().is_err());
    }

    #[test]
    fn validation_catches_negative_demand() {
        let mut cfg = ScenarioConfig::three_period();
        cfg.load.demand_kw = vec![480.0, -1.0];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "load.demand_kw[1]"));
    }
}
