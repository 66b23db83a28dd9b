//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use lf_rate::engine::{DemandInputSet, EnergyAllocation, SweepInputs};
use lf_rate::tariff::{MONTHS, RateTier, RateTierStructure, ScheduleMatrix, Tariff};

/// Weekday 08–11 and 18–21 mid-peak (1), 12–17 on-peak (2), otherwise
/// off-peak (0); weekends entirely off-peak.
///
/// January 2024 splits into 422 / 184 / 138 of 744 hours.
pub fn three_period_schedule() -> ScheduleMatrix {
    let mut weekday = [0; 24];
    for h in (8..12).chain(18..22) {
        weekday[h] = 1;
    }
    for h in 12..18 {
        weekday[h] = 2;
    }
    ScheduleMatrix::repeating(weekday, [0; 24])
}

/// Energy-only three-period tariff (0.066 / 0.093 / 0.145 $/kWh).
pub fn three_period_tariff() -> Tariff {
    Tariff::energy_only(
        "Three-period TOU",
        RateTierStructure::new(vec![
            RateTier::new("Off-peak", 0.062, 0.004),
            RateTier::new("Mid-peak", 0.089, 0.004),
            RateTier::new("On-peak", 0.141, 0.004),
        ]),
        three_period_schedule(),
    )
}

/// Flat energy tariff with two TOU demand periods billed in alternate halves
/// of the year: `winter` $/kW January–June, `summer` $/kW July–December.
pub fn seasonal_demand_tariff(winter: f64, summer: f64) -> Tariff {
    let mut grid = [[0; 24]; MONTHS];
    for row in &mut grid[6..] {
        *row = [1; 24];
    }
    let mut tariff = Tariff::energy_only(
        "Seasonal demand",
        RateTierStructure::new(vec![RateTier::new("All hours", 0.11, 0.0)]),
        ScheduleMatrix::uniform(0),
    );
    tariff.demand_rates = RateTierStructure::new(vec![
        RateTier::new("Winter demand", winter, 0.0),
        RateTier::new("Summer demand", summer, 0.0),
    ]);
    tariff.demand_schedule = Some(ScheduleMatrix::new(grid, grid));
    tariff
}

/// Inputs with a 100 kW peak.
pub fn inputs(tariff: Tariff, allocation: &[f64], demand: DemandInputSet) -> SweepInputs {
    SweepInputs::new(
        tariff,
        100.0,
        demand,
        EnergyAllocation::new(allocation.to_vec()),
    )
}
