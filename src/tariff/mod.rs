//! Rate structures, hourly period schedules, and calendars.

pub mod calendar;
pub mod rates;
pub mod schedule;
pub mod types;

pub use calendar::{CalendarContext, DEFAULT_REFERENCE_YEAR, HOURS_PER_DAY, MONTHS};
pub use rates::{RateTier, RateTierStructure};
pub use schedule::{ActivePeriodSet, HourFractions, ScheduleMatrix, ScheduleRow};
pub use types::Tariff;
