//! Hour-by-month period schedules and the indices derived from them.

use std::collections::BTreeSet;

use serde::Serialize;

use super::calendar::{CalendarContext, HOURS_PER_DAY, MONTHS, check_month, year_hours};
use crate::error::ConfigError;

/// Period index for each hour of one day.
pub type ScheduleRow = [usize; HOURS_PER_DAY];

/// Weekday and weekend period grids, one row per month.
///
/// Cells hold period indices into the matching [`RateTierStructure`]. Indices
/// are checked once with [`ScheduleMatrix::validate_indices`]; lookups after
/// that index directly.
///
/// [`RateTierStructure`]: super::rates::RateTierStructure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleMatrix {
    weekday: [ScheduleRow; MONTHS],
    weekend: [ScheduleRow; MONTHS],
}

impl ScheduleMatrix {
    pub fn new(weekday: [ScheduleRow; MONTHS], weekend: [ScheduleRow; MONTHS]) -> Self {
        Self { weekday, weekend }
    }

    /// Every hour of every day assigned to `period`.
    pub fn uniform(period: usize) -> Self {
        Self::new(
            [[period; HOURS_PER_DAY]; MONTHS],
            [[period; HOURS_PER_DAY]; MONTHS],
        )
    }

    /// Same weekday and weekend rows for all twelve months.
    pub fn repeating(weekday: ScheduleRow, weekend: ScheduleRow) -> Self {
        Self::new([weekday; MONTHS], [weekend; MONTHS])
    }

    /// Builds a matrix from loosely-shaped rows (as parsed from config).
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` under `field` if either grid is not 12 rows of
    /// 24 cells.
    pub fn from_rows(
        field: &str,
        weekday: &[Vec<usize>],
        weekend: &[Vec<usize>],
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            grid_from_rows(&format!("{field}.weekday"), weekday)?,
            grid_from_rows(&format!("{field}.weekend"), weekend)?,
        ))
    }

    /// Weekday row of a 0-based `month`, `None` past December.
    pub fn weekday(&self, month: usize) -> Option<&ScheduleRow> {
        self.weekday.get(month)
    }

    pub fn weekend(&self, month: usize) -> Option<&ScheduleRow> {
        self.weekend.get(month)
    }

    /// Checks every cell against `period_count`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` pointing at the first out-of-range cell.
    pub fn validate_indices(&self, field: &str, period_count: usize) -> Result<(), ConfigError> {
        for (kind, grid) in [("weekday", &self.weekday), ("weekend", &self.weekend)] {
            for (month, row) in grid.iter().enumerate() {
                if let Some((hour, &period)) =
                    row.iter().enumerate().find(|(_, p)| **p >= period_count)
                {
                    return Err(ConfigError::new(
                        format!("{field}.{kind}[{month}][{hour}]"),
                        format!(
                            "period index {period} out of range ({period_count} period(s) defined)"
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Periods appearing in the weekday or weekend row of `month`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `month` is not in `0..12`.
    pub fn active_periods(&self, month: usize) -> Result<ActivePeriodSet, ConfigError> {
        check_month(month)?;
        Ok(self.active_in(&self.weekday[month], &self.weekend[month]))
    }

    /// Number of months in which `period` appears at all.
    pub fn months_active(&self, period: usize) -> usize {
        self.weekday
            .iter()
            .zip(&self.weekend)
            .filter(|(weekday, weekend)| self.active_in(weekday, weekend).contains(period))
            .count()
    }

    fn active_in(&self, weekday: &ScheduleRow, weekend: &ScheduleRow) -> ActivePeriodSet {
        weekday.iter().chain(weekend.iter()).copied().collect()
    }

    /// Share of `month`'s hours spent in each period, in percent.
    ///
    /// Each weekday-row hour counts once per weekday of the month and each
    /// weekend-row hour once per weekend day.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `month` is not in `0..12`.
    pub fn hour_fractions(
        &self,
        calendar: &CalendarContext,
        month: usize,
        period_count: usize,
    ) -> Result<HourFractions, ConfigError> {
        check_month(month)?;
        let mut counts = vec![0_u64; period_count];
        self.accumulate_hours(&mut counts, calendar, month);
        Ok(HourFractions::from_counts(&counts, u64::from(calendar.total_hours)))
    }

    /// Share of the whole year's hours spent in each period, in percent.
    pub fn annual_hour_fractions(
        &self,
        year: &[CalendarContext; MONTHS],
        period_count: usize,
    ) -> HourFractions {
        let mut counts = vec![0_u64; period_count];
        for (month, calendar) in year.iter().enumerate() {
            self.accumulate_hours(&mut counts, calendar, month);
        }
        HourFractions::from_counts(&counts, u64::from(year_hours(year)))
    }

    // `month` is already known to be in range.
    fn accumulate_hours(&self, counts: &mut [u64], calendar: &CalendarContext, month: usize) {
        for hour in 0..HOURS_PER_DAY {
            if let Some(c) = counts.get_mut(self.weekday[month][hour]) {
                *c += u64::from(calendar.weekday_count);
            }
            if let Some(c) = counts.get_mut(self.weekend[month][hour]) {
                *c += u64::from(calendar.weekend_count);
            }
        }
    }
}

fn grid_from_rows(field: &str, rows: &[Vec<usize>]) -> Result<[ScheduleRow; MONTHS], ConfigError> {
    if rows.len() != MONTHS {
        return Err(ConfigError::new(
            field,
            format!("expected {MONTHS} month rows, got {}", rows.len()),
        ));
    }
    let mut grid = [[0; HOURS_PER_DAY]; MONTHS];
    for (month, (row, cells)) in grid.iter_mut().zip(rows).enumerate() {
        *row = cells.as_slice().try_into().map_err(|_| {
            ConfigError::new(
                format!("{field}[{month}]"),
                format!("expected {HOURS_PER_DAY} hourly cells, got {}", cells.len()),
            )
        })?;
    }
    Ok(grid)
}

/// Period indices active in one month, in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivePeriodSet(BTreeSet<usize>);

impl ActivePeriodSet {
    pub fn contains(&self, period: usize) -> bool {
        self.0.contains(&period)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for ActivePeriodSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Percentage of a window's hours assigned to each period, indexed by period.
///
/// Sums to 100 over periods with a nonzero share.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HourFractions(Vec<f64>);

impl HourFractions {
    fn from_counts(counts: &[u64], total_hours: u64) -> Self {
        if total_hours == 0 {
            return Self(vec![0.0; counts.len()]);
        }
        let total = total_hours as f64;
        Self(counts.iter().map(|&c| c as f64 / total * 100.0).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Share of `period`, `0.0` if it never occurs.
    pub fn get(&self, period: usize) -> f64 {
        self.0.get(period).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::calendar::{month_context, year_context};

    /// Weekday: off-peak 0-7 and 22-23, mid-peak 8-11 and 18-21, on-peak 12-17.
    /// Weekend: off-peak all day.
    fn three_period() -> ScheduleMatrix {
        let mut weekday = [0; HOURS_PER_DAY];
        for h in (8..12).chain(18..22) {
            weekday[h] = 1;
        }
        for h in 12..18 {
            weekday[h] = 2;
        }
        ScheduleMatrix::repeating(weekday, [0; HOURS_PER_DAY])
    }

    #[test]
    fn active_periods_union_both_rows() {
        let mut weekday = [[0; HOURS_PER_DAY]; MONTHS];
        let mut weekend = [[0; HOURS_PER_DAY]; MONTHS];
        weekday[6][15] = 2;
        weekend[6][3] = 1;
        let schedule = ScheduleMatrix::new(weekday, weekend);

        let july: Vec<usize> = schedule.active_periods(6).unwrap().iter().collect();
        assert_eq!(july, vec![0, 1, 2]);
        let january: Vec<usize> = schedule.active_periods(0).unwrap().iter().collect();
        assert_eq!(january, vec![0]);
        assert_eq!(schedule.months_active(2), 1);
        assert_eq!(schedule.months_active(0), 12);
    }

    #[test]
    fn january_hour_fractions() {
        let ctx = month_context(0, 2024).unwrap();
        let fractions = three_period().hour_fractions(&ctx, 0, 3).unwrap();
        // 23 weekdays, 8 weekend days, 744 hours.
        assert!((fractions.get(0) - 422.0 / 744.0 * 100.0).abs() < 1e-9);
        assert!((fractions.get(1) - 184.0 / 744.0 * 100.0).abs() < 1e-9);
        assert!((fractions.get(2) - 138.0 / 744.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn fractions_sum_to_100_every_month() {
        let schedule = three_period();
        let year = year_context(2024).unwrap();
        for (month, ctx) in year.iter().enumerate() {
            let total = schedule.hour_fractions(ctx, month, 3).unwrap().total();
            assert!((total - 100.0).abs() < 1e-6, "month {month}: {total}");
        }
        let annual = schedule.annual_hour_fractions(&year, 3).total();
        assert!((annual - 100.0).abs() < 1e-6);
    }

    #[test]
    fn unused_period_has_zero_fraction() {
        let ctx = month_context(3, 2024).unwrap();
        let fractions = ScheduleMatrix::uniform(0).hour_fractions(&ctx, 3, 2).unwrap();
        assert_eq!(fractions.get(0), 100.0);
        assert_eq!(fractions.get(1), 0.0);
        assert_eq!(fractions.get(7), 0.0);
    }

    #[test]
    fn month_past_december_is_rejected() {
        let schedule = three_period();
        let ctx = month_context(11, 2024).unwrap();
        assert_eq!(schedule.active_periods(12).unwrap_err().field, "month");
        assert_eq!(schedule.hour_fractions(&ctx, 12, 3).unwrap_err().field, "month");
        assert!(schedule.weekday(12).is_none());
        assert!(schedule.weekend(12).is_none());
        assert_eq!(schedule.weekday(11).map(|row| row[12]), Some(2));
    }

    #[test]
    fn index_validation_reports_cell() {
        let mut weekend = [[0; HOURS_PER_DAY]; MONTHS];
        weekend[4][20] = 3;
        let schedule = ScheduleMatrix::new([[0; HOURS_PER_DAY]; MONTHS], weekend);
        let err = schedule.validate_indices("tariff.energy_schedule", 3).unwrap_err();
        assert_eq!(err.field, "tariff.energy_schedule.weekend[4][20]");
        assert!(schedule.validate_indices("tariff.energy_schedule", 4).is_ok());
    }

    #[test]
    fn from_rows_rejects_short_month() {
        let weekday = vec![vec![0; HOURS_PER_DAY]; MONTHS];
        let mut weekend = vec![vec![0; HOURS_PER_DAY]; MONTHS];
        weekend[2].pop();
        let err = ScheduleMatrix::from_rows("s", &weekday, &weekend).unwrap_err();
        assert_eq!(err.field, "s.weekend[2]");

        let err = ScheduleMatrix::from_rows("s", &weekday[..11], &weekday).unwrap_err();
        assert_eq!(err.field, "s.weekday");
    }
}
