//! Forecast message templates
//!
//! Each series (closed deals, meetings) picks one of six clauses from its
//! month-over-month daily rates. Changes below 5% in either direction read
//! as steady.

use crate::trend::percent_change;

const SIGNIFICANT_CHANGE_PCT: f64 = 5.0;

/// Clause describing one series, lowercase
pub fn series_clause(subject: &str, current: f64, previous: f64) -> String {
    if previous == 0.0 && current == 0.0 {
        return format!("no {} were recorded this month or last month", subject);
    }
    if previous == 0.0 {
        return format!("{} picked up this month after none last month", subject);
    }
    if current == 0.0 {
        return format!("{} have stopped this month after activity last month", subject);
    }

    match percent_change(current, previous) {
        Some(pct) if pct >= SIGNIFICANT_CHANGE_PCT => {
            format!("{} are up {:.0}% over last month", subject, pct)
        }
        Some(pct) if pct <= -SIGNIFICANT_CHANGE_PCT => {
            format!("{} are down {:.0}% from last month", subject, pct.abs())
        }
        _ => format!("{} are holding steady compared with last month", subject),
    }
}

/// Estimate sentence shared by every non-empty projection
pub fn estimate_sentence(week: (u32, u32), month: (u32, u32)) -> String {
    format!(
        "Next week: about {} closed deals from {} meetings. Next month: about {} closed deals from {} meetings.",
        week.0, week.1, month.0, month.1
    )
}

/// Full projection message: trend sentence followed by the estimates
///
/// Rates are `(current, previous)` daily rates; estimates are
/// `(closed, meetings)`.
pub fn build_message(
    closed_rates: (f64, f64),
    meeting_rates: (f64, f64),
    week: (u32, u32),
    month: (u32, u32),
) -> String {
    let closed = series_clause("closed deals", closed_rates.0, closed_rates.1);
    let meetings = series_clause("meetings", meeting_rates.0, meeting_rates.1);
    format!(
        "{}, while {}. {}",
        capitalize(&closed),
        meetings,
        estimate_sentence(week, month)
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
