//! Physical feasibility of an energy allocation at a given load factor.
//!
//! At load factor `LF`, a period holding `h`% of the hours and `e`% of the
//! energy draws `(e / h) * LF` times the peak demand while it is active. That
//! cannot exceed the peak, so each allocated period bounds `LF <= h / e`, and
//! the tightest of these bounds is the ceiling.

use serde::Serialize;

use super::types::AllocationSource;

/// Default slack when comparing a swept load factor against the bound.
///
/// Absorbs rounding from the 1% sweep steps; not a business rule.
pub const LOAD_FACTOR_TOLERANCE: f64 = 0.005;

/// Why the feasibility bound has the value it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeasibilityLimit {
    /// No allocated period constrains the load factor below 100%.
    Unconstrained,
    /// `period` has the smallest hour-to-energy ratio.
    Binding { period: usize },
    /// Energy was allocated to `period`, which has no hours at all.
    ZeroHours { period: usize },
    /// No energy was allocated to any period.
    NoAllocation,
}

/// Maximum load factor at which the user's allocation can be realised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Feasibility {
    /// In `[0, 1]`.
    pub max_load_factor: f64,
    pub limit: FeasibilityLimit,
}

/// Computes the highest load factor consistent with `allocation`.
///
/// Both slices are percentages indexed by period.
///
/// # Examples
///
/// ```
/// use lf_rate::engine::feasibility::{FeasibilityLimit, max_valid_load_factor};
///
/// let bound = max_valid_load_factor(&[100.0, 0.0], &[50.0, 50.0]);
/// assert_eq!(bound.max_load_factor, 0.5);
/// assert_eq!(bound.limit, FeasibilityLimit::Binding { period: 0 });
/// ```
pub fn max_valid_load_factor(allocation: &[f64], hour_fractions: &[f64]) -> Feasibility {
    let mut bound = Feasibility {
        max_load_factor: 1.0,
        limit: FeasibilityLimit::NoAllocation,
    };
    let mut allocated = false;

    for (period, &share) in allocation.iter().enumerate() {
        if share <= 0.0 {
            continue;
        }
        let hours = hour_fractions.get(period).copied().unwrap_or(0.0);
        if hours <= 0.0 {
            return Feasibility {
                max_load_factor: 0.0,
                limit: FeasibilityLimit::ZeroHours { period },
            };
        }
        if !allocated {
            allocated = true;
            bound.limit = FeasibilityLimit::Unconstrained;
        }
        let ratio = hours / share;
        if ratio < bound.max_load_factor {
            bound = Feasibility {
                max_load_factor: ratio,
                limit: FeasibilityLimit::Binding { period },
            };
        }
    }

    if !allocated {
        bound.max_load_factor = 0.0;
    }
    bound
}

/// Decides whether `requested` load factor can use the user's allocation.
pub fn allocation_source(requested: f64, max_valid: f64, tolerance: f64) -> AllocationSource {
    if requested <= max_valid + tolerance {
        AllocationSource::User
    } else {
        AllocationSource::Forced
    }
}

/// Picks the allocation to price `requested` load factor with.
///
/// Above the bound the facility must draw power across all active periods in
/// proportion to their duration, which is exact at 100%.
pub fn effective_allocation<'a>(
    requested: f64,
    max_valid: f64,
    user: &'a [f64],
    hour_fractions: &'a [f64],
    tolerance: f64,
) -> (AllocationSource, &'a [f64]) {
    match allocation_source(requested, max_valid, tolerance) {
        AllocationSource::User => (AllocationSource::User, user),
        AllocationSource::Forced => (AllocationSource::Forced, hour_fractions),
    }
}
