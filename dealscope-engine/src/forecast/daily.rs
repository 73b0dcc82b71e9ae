//! Month-over-month daily rates and the trend-adjusted projection
//!
//! The current month runs from its 1st through `today` inclusive; the
//! previous month is the full preceding calendar month. Rates are counts per
//! calendar day of each window.

use crate::trend::{classify, Trend};
use chrono::{Datelike, NaiveDate};
use dealscope_common::time::{days_in_month, month_start, previous_month_start};
use dealscope_common::{EngineParams, Record};

/// Daily closed/meeting rates for both months
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthRates {
    pub current_closed: f64,
    pub current_meetings: f64,
    pub previous_closed: f64,
    pub previous_meetings: f64,
    /// Days of the current month counted so far (including today)
    pub days_elapsed: u32,
}

/// Trend-adjusted daily rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyProjection {
    pub trend_closed: Trend,
    pub trend_meetings: Trend,
    pub closed_per_day: f64,
    pub meetings_per_day: f64,
}

impl DailyProjection {
    /// Estimated (closed, meetings) over `days`, rounded to whole deals
    pub fn estimate(&self, days: u32) -> (u32, u32) {
        (
            round_count(self.closed_per_day * days as f64),
            round_count(self.meetings_per_day * days as f64),
        )
    }
}

pub(crate) fn round_count(value: f64) -> u32 {
    if value <= 0.0 {
        0
    } else {
        value.round() as u32
    }
}

/// Count meetings and closed deals per day in the current and previous month
pub fn month_rates(records: &[Record], today: NaiveDate) -> MonthRates {
    let current_start = month_start(today);
    let previous_start = previous_month_start(today);
    let previous_days = days_in_month(previous_start);
    let days_elapsed = today.day();

    let mut current = (0u32, 0u32);
    let mut previous = (0u32, 0u32);
    for record in records {
        let date = record.meeting_date;
        let bucket = if date >= current_start && date <= today {
            &mut current
        } else if date >= previous_start && date < current_start {
            &mut previous
        } else {
            continue;
        };
        bucket.0 += 1;
        if record.closed {
            bucket.1 += 1;
        }
    }

    MonthRates {
        current_meetings: current.0 as f64 / days_elapsed as f64,
        current_closed: current.1 as f64 / days_elapsed as f64,
        previous_meetings: previous.0 as f64 / previous_days as f64,
        previous_closed: previous.1 as f64 / previous_days as f64,
        days_elapsed,
    }
}

fn multiplier(trend: Trend, params: &EngineParams) -> f64 {
    match trend {
        Trend::Increasing => params.increasing_multiplier,
        Trend::Decreasing => params.decreasing_multiplier,
        Trend::Stable | Trend::Neutral => 1.0,
    }
}

/// Classify each series month-over-month and scale the current rate
pub fn project_daily(rates: &MonthRates, params: &EngineParams) -> DailyProjection {
    let threshold = params.monthly_trend_threshold;
    let trend_closed = classify(rates.current_closed, rates.previous_closed, threshold);
    let trend_meetings = classify(rates.current_meetings, rates.previous_meetings, threshold);

    DailyProjection {
        trend_closed,
        trend_meetings,
        closed_per_day: rates.current_closed * multiplier(trend_closed, params),
        meetings_per_day: rates.current_meetings * multiplier(trend_meetings, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn meetings(out: &mut Vec<Record>, day: NaiveDate, count: usize, closed: usize) {
        for i in 0..count {
            let id = out.len() as i64;
            out.push(Record::new(id, day).with_closed(i < closed));
        }
    }

    #[test]
    fn test_month_rates_windows() {
        let mut records = Vec::new();
        meetings(&mut records, date(2024, 4, 5), 30, 15); // April: 30 days
        meetings(&mut records, date(2024, 5, 2), 10, 5);
        meetings(&mut records, date(2024, 5, 25), 4, 4); // after today
        meetings(&mut records, date(2024, 3, 30), 7, 7); // outside both windows

        let rates = month_rates(&records, date(2024, 5, 10));
        assert_eq!(rates.days_elapsed, 10);
        assert_eq!(rates.current_meetings, 1.0);
        assert_eq!(rates.current_closed, 0.5);
        assert_eq!(rates.previous_meetings, 1.0);
        assert_eq!(rates.previous_closed, 0.5);
    }

    #[test]
    fn test_stable_projection_keeps_rate() {
        let rates = MonthRates {
            current_closed: 0.5,
            current_meetings: 1.0,
            previous_closed: 0.5,
            previous_meetings: 1.0,
            days_elapsed: 10,
        };
        let projection = project_daily(&rates, &EngineParams::default());
        assert_eq!(projection.trend_closed, Trend::Stable);
        assert_eq!(projection.closed_per_day, 0.5);
        assert_eq!(projection.estimate(7), (4, 7));
    }

    #[test]
    fn test_multipliers_follow_trend() {
        let rates = MonthRates {
            current_closed: 2.0,
            current_meetings: 1.0,
            previous_closed: 1.0,
            previous_meetings: 2.0,
            days_elapsed: 10,
        };
        let projection = project_daily(&rates, &EngineParams::default());
        assert_eq!(projection.trend_closed, Trend::Increasing);
        assert_eq!(projection.trend_meetings, Trend::Decreasing);
        assert!((projection.closed_per_day - 2.1).abs() < 1e-12);
        assert!((projection.meetings_per_day - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_zero_previous_month_is_increasing() {
        let rates = MonthRates {
            current_closed: 0.2,
            current_meetings: 0.4,
            previous_closed: 0.0,
            previous_meetings: 0.0,
            days_elapsed: 5,
        };
        let projection = project_daily(&rates, &EngineParams::default());
        assert_eq!(projection.trend_closed, Trend::Increasing);
        assert_eq!(projection.trend_meetings, Trend::Increasing);
    }

    #[test]
    fn test_round_count_never_negative() {
        assert_eq!(round_count(-3.0), 0);
        assert_eq!(round_count(2.5), 3);
        assert_eq!(round_count(2.49), 2);
    }
}
