//! Calendar helpers shared by obligation generation, reconciliation and reporting.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of days in `month` (1-based) of `year`, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Truncates a point in time to its calendar day.
///
/// Overdue checks compare due dates against this value, so anything due today
/// stays pending until the day is over.
pub fn start_of_day(moment: NaiveDateTime) -> NaiveDate {
    moment.date()
}

/// Returns the `(year, month)` pair a date belongs to.
pub fn month_key(date: NaiveDate) -> MonthKey {
    MonthKey::of(date)
}

/// Due date for `due_day` within `month`, clamped to the month's last day.
pub fn due_date_in(month: MonthKey, due_day: u32) -> NaiveDate {
    let day = due_day.clamp(1, month.days());
    NaiveDate::from_ymd_opt(month.year, month.month, day).unwrap_or_else(|| month.last_day())
}

/// Inclusive day window starting at `start` and spanning `days` further days.
pub fn window_end(start: NaiveDate, days: u32) -> NaiveDate {
    start
        .checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// A calendar month, used to match obligations and to bucket reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn last_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, self.days()).unwrap_or(NaiveDate::MAX)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Error returned when a `YYYY-MM` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month `{0}`, expected YYYY-MM")]
pub struct ParseMonthError(String);

impl FromStr for MonthKey {
    type Err = ParseMonthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseMonthError(value.to_string());
        let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month).ok_or_else(invalid)
    }
}

/// Clock abstracts access to the current time so evaluations stay deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the reference day used for due-date comparisons.
    ///
    /// This is the UTC calendar day of [`Clock::now`], the same basis used for
    /// stored timestamps such as `createdAt`.
    fn today(&self) -> NaiveDate {
        start_of_day(self.now().naive_utc())
    }
}

/// Real-time clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Pins the clock to noon UTC of `date`.
    pub fn on(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self::new(DateTime::from_naive_utc_and_offset(noon, Utc))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}
