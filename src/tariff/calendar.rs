//! Weekday/weekend day counts and billable hours per calendar month.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::ConfigError;

/// Months in a billing year.
pub const MONTHS: usize = 12;
/// Hours in one schedule row.
pub const HOURS_PER_DAY: usize = 24;
/// Leap year used when the caller does not pick one, so annual totals cover 8784 hours.
pub const DEFAULT_REFERENCE_YEAR: i32 = 2024;

/// Day and hour counts for one month of a reference year.
///
/// # Examples
///
/// ```
/// use lf_rate::tariff::calendar::month_context;
///
/// let january = month_context(0, 2024).unwrap();
/// assert_eq!(january.weekday_count, 23);
/// assert_eq!(january.weekend_count, 8);
/// assert_eq!(january.total_hours, 744);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarContext {
    /// Monday to Friday days in the month.
    pub weekday_count: u32,
    /// Saturday and Sunday days in the month.
    pub weekend_count: u32,
    /// `(weekday_count + weekend_count) * 24`.
    pub total_hours: u32,
}

impl CalendarContext {
    /// Number of days in the month.
    pub fn days(&self) -> u32 {
        self.weekday_count + self.weekend_count
    }
}

/// Checks that a 0-based `month` is in `0..12`.
///
/// # Errors
///
/// Returns a `ConfigError` on the `month` field otherwise.
pub fn check_month(month: usize) -> Result<(), ConfigError> {
    if month < MONTHS {
        Ok(())
    } else {
        Err(ConfigError::new(
            "month",
            format!("must be in 0..{MONTHS} (0 = January), got {month}"),
        ))
    }
}

/// Resolves the calendar of a 0-based `month` (0 = January) in `year`.
///
/// # Errors
///
/// Returns a `ConfigError` if `month` is not in `0..12` or `year` is outside
/// the supported calendar range.
pub fn month_context(month: usize, year: i32) -> Result<CalendarContext, ConfigError> {
    check_month(month)?;
    let month0 = month as u32;
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1).ok_or_else(|| {
        ConfigError::new(
            "calculation.reference_year",
            format!("{year} is outside the supported calendar range"),
        )
    })?;

    let mut weekday_count = 0;
    let mut weekend_count = 0;
    for date in first.iter_days().take_while(|d| d.month0() == month0) {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => weekend_count += 1,
            _ => weekday_count += 1,
        }
    }

    Ok(CalendarContext {
        weekday_count,
        weekend_count,
        total_hours: (weekday_count + weekend_count) * HOURS_PER_DAY as u32,
    })
}

/// Resolves all twelve months of `year`.
///
/// # Errors
///
/// Returns a `ConfigError` if `year` is outside the supported calendar range.
pub fn year_context(year: i32) -> Result<[CalendarContext; MONTHS], ConfigError> {
    let mut contexts = [CalendarContext::default(); MONTHS];
    for (month, context) in contexts.iter_mut().enumerate() {
        *context = month_context(month, year)?;
    }
    Ok(contexts)
}

/// Total hours across a resolved year.
pub fn year_hours(year: &[CalendarContext; MONTHS]) -> u32 {
    year.iter().map(|c| c.total_hours).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn january_2024() {
        let ctx = month_context(0, 2024).unwrap();
        assert_eq!(ctx.weekday_count, 23);
        assert_eq!(ctx.weekend_count, 8);
        assert_eq!(ctx.total_hours, 744);
    }

    #[test]
    fn leap_february() {
        let ctx = month_context(1, 2024).unwrap();
        assert_eq!(ctx.days(), 29);
        assert_eq!(ctx.weekday_count, 21);
        assert_eq!(ctx.weekend_count, 8);
        assert_eq!(ctx.total_hours, 696);
    }

    #[test]
    fn common_february() {
        let ctx = month_context(1, 2023).unwrap();
        assert_eq!(ctx.days(), 28);
        assert_eq!(ctx.weekday_count, 20);
        assert_eq!(ctx.weekend_count, 8);
    }

    #[test]
    fn march_2024_ends_on_a_weekend() {
        // Mar 1 2024 is a Friday; the 30th and 31st fall on Sat/Sun.
        let ctx = month_context(2, 2024).unwrap();
        assert_eq!(ctx.weekday_count, 21);
        assert_eq!(ctx.weekend_count, 10);
    }

    #[test]
    fn month_out_of_range() {
        let err = month_context(12, 2024).unwrap_err();
        assert_eq!(err.field, "month");
    }

    #[test]
    fn year_out_of_range() {
        let err = month_context(0, 1_000_000).unwrap_err();
        assert_eq!(err.field, "calculation.reference_year");
    }

    #[test]
    fn leap_year_totals() {
        let year = year_context(2024).unwrap();
        assert_eq!(year_hours(&year), 8784);
        let weekend: u32 = year.iter().map(|c| c.weekend_count).sum();
        assert_eq!(weekend, 104);
    }

    #[test]
    fn common_year_totals() {
        let year = year_context(2023).unwrap();
        assert_eq!(year_hours(&year), 8760);
    }
}
