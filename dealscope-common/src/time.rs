//! Clock and calendar utilities
//!
//! Every time-relative computation (weekly bucketing, month-over-month
//! trends, recent-industry windows) reads "today" from a [`Clock`] passed in
//! by the caller. Nothing in the engine calls `Utc::now()` directly.

use chrono::{Datelike, Duration, NaiveDate, Utc};

/// Source of the current calendar date
pub trait Clock: Send + Sync {
    /// Current date in UTC
    fn today(&self) -> NaiveDate;
}

/// Wall clock, backed by `chrono::Utc`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to a single date (tests, historical re-runs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let start = month_start(date);
    let next = next_month_start(start);
    (next - start).num_days() as u32
}

/// First day of the month following the one containing `date`
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    // Day 32 from the 1st always lands inside the following month
    month_start(start + Duration::days(32))
}

/// First day of the month preceding the one containing `date`
pub fn previous_month_start(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    month_start(start - Duration::days(1))
}

/// ISO year-week key, e.g. `2024-W07`
///
/// Zero-padded so lexicographic order matches chronological order.
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// Canonical `YYYY-MM-DD` rendering used in stored rows and timelines
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| crate::Error::InvalidInput(format!("Invalid date '{}': {}", value, e)))
}
