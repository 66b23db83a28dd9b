//! Position-indexed rate tiers for energy, TOU demand, and flat demand.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One billing period's price: base rate plus rider adjustment.
///
/// Energy tiers are priced in $/kWh, demand tiers in $/kW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateTier {
    /// Display label, e.g. `"On-peak"`.
    pub label: String,
    /// Base rate.
    pub rate: f64,
    /// Adjustment added on top of the base rate (riders, fuel cost, etc.).
    #[serde(default)]
    pub adjustment: f64,
}

impl RateTier {
    pub fn new(label: impl Into<String>, rate: f64, adjustment: f64) -> Self {
        Self {
            label: label.into(),
            rate,
            adjustment,
        }
    }

    /// Billed price: `rate + adjustment`.
    pub fn total_rate(&self) -> f64 {
        self.rate + self.adjustment
    }
}

/// Ordered tiers where the position is the period index used by schedules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RateTierStructure {
    tiers: Vec<RateTier>,
}

impl RateTierStructure {
    pub fn new(tiers: Vec<RateTier>) -> Self {
        Self { tiers }
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn get(&self, period: usize) -> Option<&RateTier> {
        self.tiers.get(period)
    }

    /// Billed price of `period`, or `0.0` for an unknown index.
    pub fn total_rate(&self, period: usize) -> f64 {
        self.tiers.get(period).map_or(0.0, RateTier::total_rate)
    }

    /// Label of `period`, falling back to `"Period {n}"` (1-based).
    pub fn label(&self, period: usize) -> String {
        self.tiers
            .get(period)
            .map_or_else(|| format!("Period {}", period + 1), |t| t.label.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RateTier> {
        self.tiers.iter()
    }

    /// Checks that every rate and adjustment is finite.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first offending tier under `field`.
    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        for (i, tier) in self.tiers.iter().enumerate() {
            if !tier.rate.is_finite() || !tier.adjustment.is_finite() {
                return Err(ConfigError::new(
                    format!("{field}[{i}]"),
                    format!("rate and adjustment of \"{}\" must be finite", tier.label),
                ));
            }
        }
        Ok(())
    }
}

impl FromIterator<RateTier> for RateTierStructure {
    fn from_iter<I: IntoIterator<Item = RateTier>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
