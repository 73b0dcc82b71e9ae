//! Forecast Projector
//!
//! Projects closed deals and meetings for the next week and the next
//! calendar month, relative to an injected [`Clock`].
//!
//! The daily-rate projection ([`daily`]) is authoritative. The weekly
//! weighted average ([`weekly`]) only feeds the confidence label and the
//! diagnostics block.
//!
//! Two explicit low-data states replace the normal path:
//! - no records on or before today: everything zero, confidence low
//! - a single ISO week of activity: that week's counts stand in for next
//!   week and scale by `days_in_next_month / 7` for next month

pub mod confidence;
pub mod daily;
pub mod message;
pub mod timeline;
pub mod weekly;

pub use confidence::Confidence;
pub use timeline::{Period, TimelineEntry};
pub use weekly::WeeklyBucket;

use crate::aggregator::round_to;
use crate::trend::Trend;
use chrono::NaiveDate;
use daily::{round_count, DailyProjection};
use dealscope_common::time::{days_in_month, next_month_start};
use dealscope_common::{Clock, EngineParams, Record};
use serde::{Deserialize, Serialize};

pub const INSUFFICIENT_DATA_MESSAGE: &str = "Insufficient data for projection.";
pub const LIMITED_DATA_MESSAGE: &str = "Limited data available: projection based on a single week of activity.";

/// Estimate for one horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodEstimate {
    pub estimated_closed: u32,
    pub estimated_meetings: u32,
    pub confidence: Confidence,
    pub trend_closed: Trend,
    pub trend_meetings: Trend,
}

impl PeriodEstimate {
    fn empty() -> Self {
        Self {
            estimated_closed: 0,
            estimated_meetings: 0,
            confidence: Confidence::Low,
            trend_closed: Trend::Neutral,
            trend_meetings: Trend::Neutral,
        }
    }
}

/// Weekly-bucket figures behind the confidence label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyDiagnostics {
    pub buckets_used: usize,
    pub weighted_closed: f64,
    pub trend: Trend,
    pub coefficient_of_variation: f64,
}

impl Default for WeeklyDiagnostics {
    fn default() -> Self {
        Self {
            buckets_used: 0,
            weighted_closed: 0.0,
            trend: Trend::Neutral,
            coefficient_of_variation: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub next_week: PeriodEstimate,
    pub next_month: PeriodEstimate,
    pub message: String,
    /// Records dated on or before today
    pub data_points: usize,
    pub timeline: Vec<TimelineEntry>,
    pub weekly: WeeklyDiagnostics,
}

impl ProjectionResult {
    /// The zero-records state
    pub fn insufficient() -> Self {
        Self {
            next_week: PeriodEstimate::empty(),
            next_month: PeriodEstimate::empty(),
            message: INSUFFICIENT_DATA_MESSAGE.to_string(),
            data_points: 0,
            timeline: Vec::new(),
            weekly: WeeklyDiagnostics::default(),
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.data_points == 0
    }
}

/// Project the next week and next month from `records`
pub fn project(records: &[Record], clock: &dyn Clock, params: &EngineParams) -> ProjectionResult {
    project_at(records, clock.today(), params)
}

/// [`project`] against an already-read `today`
pub fn project_at(records: &[Record], today: NaiveDate, params: &EngineParams) -> ProjectionResult {
    let considered: Vec<Record> = records.iter().filter(|r| r.meeting_date <= today).cloned().collect();
    if considered.is_empty() {
        tracing::debug!(%today, "No records on or before today, projection skipped");
        return ProjectionResult::insufficient();
    }

    let days_next_month = days_in_month(next_month_start(today));
    let buckets = weekly::weekly_buckets(&considered, today);
    let recent = weekly::last_n(&buckets, params.weekly_window());
    let closed_counts: Vec<f64> = recent.iter().map(|b| b.closed as f64).collect();
    let cv = confidence::coefficient_of_variation(&closed_counts);
    let diagnostics = WeeklyDiagnostics {
        buckets_used: recent.len(),
        weighted_closed: round_to(weekly::weighted_closed(recent, &params.weekly_weights), 2),
        trend: weekly::weekly_trend(recent, params.weekly_trend_threshold),
        coefficient_of_variation: round_to(cv, 4),
    };

    if buckets.len() < 2 {
        return project_single_week(&considered, &buckets, today, days_next_month, diagnostics);
    }

    let rates = daily::month_rates(&considered, today);
    let projection = daily::project_daily(&rates, params);
    let label = confidence::confidence_from_cv(cv, params.low_variance_threshold);
    let week = projection.estimate(7);
    let month = projection.estimate(days_next_month);

    let estimate = |(closed, meetings): (u32, u32)| PeriodEstimate {
        estimated_closed: closed,
        estimated_meetings: meetings,
        confidence: label,
        trend_closed: projection.trend_closed,
        trend_meetings: projection.trend_meetings,
    };

    tracing::debug!(
        %today,
        data_points = considered.len(),
        weeks = buckets.len(),
        cv = diagnostics.coefficient_of_variation,
        confidence = label.as_str(),
        "Projection computed"
    );

    ProjectionResult {
        next_week: estimate(week),
        next_month: estimate(month),
        message: message::build_message(
            (rates.current_closed, rates.previous_closed),
            (rates.current_meetings, rates.previous_meetings),
            week,
            month,
        ),
        data_points: considered.len(),
        timeline: timeline::build_timeline(&considered, today, &projection),
        weekly: diagnostics,
    }
}

fn project_single_week(
    records: &[Record],
    buckets: &[WeeklyBucket],
    today: NaiveDate,
    days_next_month: u32,
    weekly: WeeklyDiagnostics,
) -> ProjectionResult {
    let (week_closed, week_meetings) = buckets
        .first()
        .map(|b| (b.closed as f64, b.total as f64))
        .unwrap_or_default();
    let scale = days_next_month as f64 / 7.0;
    let week = (round_count(week_closed), round_count(week_meetings));
    let month = (round_count(week_closed * scale), round_count(week_meetings * scale));

    let estimate = |(closed, meetings): (u32, u32)| PeriodEstimate {
        estimated_closed: closed,
        estimated_meetings: meetings,
        confidence: Confidence::Low,
        trend_closed: Trend::Neutral,
        trend_meetings: Trend::Neutral,
    };

    let projection = DailyProjection {
        trend_closed: Trend::Neutral,
        trend_meetings: Trend::Neutral,
        closed_per_day: week_closed / 7.0,
        meetings_per_day: week_meetings / 7.0,
    };

    tracing::debug!(%today, data_points = records.len(), "Single week of activity, limited projection");

    ProjectionResult {
        next_week: estimate(week),
        next_month: estimate(month),
        message: format!("{} {}", LIMITED_DATA_MESSAGE, message::estimate_sentence(week, month)),
        data_points: records.len(),
        timeline: timeline::build_timeline(records, today, &projection),
        weekly,
    }
}
