//! Post-hoc summary of a sweep.

use std::fmt;

use super::types::{AllocationSource, SweepResult};

/// Headline figures derived from a complete sweep.
///
/// Computed post-hoc from the rows so the summary can never disagree with
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSummary {
    /// Number of evaluated load factors.
    pub points: usize,
    /// Points priced with the forced (hour-fraction) allocation.
    pub forced_points: usize,
    /// Feasibility bound of the user's allocation.
    pub max_valid_load_factor: f64,
    /// `(load_factor, rate)` with the lowest effective rate.
    pub lowest_rate: Option<(f64, f64)>,
    /// `(load_factor, rate)` with the highest effective rate.
    pub highest_rate: Option<(f64, f64)>,
    /// Effective rate at 100% load factor.
    pub full_load_rate: Option<f64>,
}

impl SweepSummary {
    pub fn from_result(result: &SweepResult) -> Self {
        let rated = || {
            result
                .rows
                .iter()
                .filter_map(|r| r.effective_rate.map(|rate| (r.load_factor, rate)))
        };
        Self {
            points: result.rows.len(),
            forced_points: result
                .rows
                .iter()
                .filter(|r| r.allocation == AllocationSource::Forced)
                .count(),
            max_valid_load_factor: result.feasibility.max_load_factor,
            lowest_rate: rated().min_by(|a, b| a.1.total_cmp(&b.1)),
            highest_rate: rated().max_by(|a, b| a.1.total_cmp(&b.1)),
            full_load_rate: result
                .rows
                .iter()
                .find(|r| r.load_factor >= 1.0)
                .and_then(|r| r.effective_rate),
        }
    }
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Sweep Summary ---")?;
        writeln!(f, "Load factors evaluated: {}", self.points)?;
        writeln!(f, "Forced-allocation points: {}", self.forced_points)?;
        writeln!(
            f,
            "Max valid load factor:  {:.2}%",
            self.max_valid_load_factor * 100.0
        )?;
        if let Some((lf, rate)) = self.lowest_rate {
            writeln!(f, "Lowest effective rate:  {rate:.5} $/kWh at {:.0}%", lf * 100.0)?;
        }
        if let Some((lf, rate)) = self.highest_rate {
            writeln!(f, "Highest effective rate: {rate:.5} $/kWh at {:.0}%", lf * 100.0)?;
        }
        match self.full_load_rate {
            Some(rate) => write!(f, "Rate at 100% load:      {rate:.5} $/kWh"),
            None => write!(f, "Rate at 100% load:      N/A"),
        }
    }
}
