//! Daily actual + projected series

use super::daily::DailyProjection;
use crate::aggregator::round_to;
use chrono::{Days, NaiveDate};
use dealscope_common::time::{days_in_month, format_date, month_start, next_month_start};
use dealscope_common::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Current,
    Projected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// `YYYY-MM-DD`
    pub date: String,
    pub period: Period,
    pub meetings: f64,
    pub closed: f64,
}

/// One `current` entry per calendar day of this month, then one
/// `projected` entry per day of next month
///
/// Current days after `today` have no records yet and read as zero.
pub fn build_timeline(records: &[Record], today: NaiveDate, projection: &DailyProjection) -> Vec<TimelineEntry> {
    let start = month_start(today);
    let mut per_day: HashMap<NaiveDate, (u32, u32)> = HashMap::new();
    for record in records.iter().filter(|r| r.meeting_date >= start && r.meeting_date <= today) {
        let entry = per_day.entry(record.meeting_date).or_default();
        entry.0 += 1;
        if record.closed {
            entry.1 += 1;
        }
    }

    let mut timeline = Vec::new();
    for day in start.iter_days().take(days_in_month(today) as usize) {
        let (meetings, closed) = per_day.get(&day).copied().unwrap_or_default();
        timeline.push(TimelineEntry {
            date: format_date(day),
            period: Period::Current,
            meetings: meetings as f64,
            closed: closed as f64,
        });
    }

    let next_start = next_month_start(today);
    let meetings = round_to(projection.meetings_per_day, 2);
    let closed = round_to(projection.closed_per_day, 2);
    for offset in 0..days_in_month(next_start) {
        let Some(day) = next_start.checked_add_days(Days::new(offset as u64)) else {
            break;
        };
        timeline.push(TimelineEntry {
            date: format_date(day),
            period: Period::Projected,
            meetings,
            closed,
        });
    }

    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::Trend;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn projection(closed: f64, meetings: f64) -> DailyProjection {
        DailyProjection {
            trend_closed: Trend::Stable,
            trend_meetings: Trend::Stable,
            closed_per_day: closed,
            meetings_per_day: meetings,
        }
    }

    #[test]
    fn test_current_days_zero_filled() {
        let records = vec![
            Record::new(1, date(2024, 1, 2)).with_closed(true),
            Record::new(2, date(2024, 1, 2)),
            Record::new(3, date(2023, 12, 31)),
        ];
        let timeline = build_timeline(&records, date(2024, 1, 3), &projection(0.0, 0.0));

        let current: Vec<_> = timeline.iter().filter(|e| e.period == Period::Current).collect();
        assert_eq!(current.len(), 31);
        assert_eq!(current[0].date, "2024-01-01");
        assert_eq!(current[0].meetings, 0.0);
        assert_eq!(current[1].meetings, 2.0);
        assert_eq!(current[1].closed, 1.0);
        assert_eq!(current[2].date, "2024-01-03");
        assert_eq!(current[30].date, "2024-01-31");
        assert!(current[3..].iter().all(|e| e.meetings == 0.0 && e.closed == 0.0));
    }

    #[test]
    fn test_projected_covers_next_month() {
        let timeline = build_timeline(&[], date(2024, 1, 31), &projection(0.3333, 1.0 / 3.0));
        let projected: Vec<_> = timeline.iter().filter(|e| e.period == Period::Projected).collect();
        // February 2024 is a leap month
        assert_eq!(projected.len(), 29);
        assert_eq!(projected[0].date, "2024-02-01");
        assert_eq!(projected[28].date, "2024-02-29");
        assert!(projected.iter().all(|e| e.meetings == 0.33 && e.closed == 0.33));
        assert_eq!(timeline.len(), 31 + 29);
    }

    #[test]
    fn test_period_serialized_lowercase() {
        let json = serde_json::to_string(&Period::Projected).unwrap();
        assert_eq!(json, "\"projected\"");
    }
}
