//! Input validation errors shared by the configuration layer and the engine.

use std::fmt;

/// Configuration error with field path and constraint description.
///
/// Raised for anything that makes a calculation meaningless: malformed
/// schedules, out-of-range months or period indices, and allocations that do
/// not sum to 100%. Computation stops at the first one and nothing partial is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"tariff.energy_schedule.weekday[3][12]"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    /// Creates an error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}
