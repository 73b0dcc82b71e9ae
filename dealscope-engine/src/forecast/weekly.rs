//! Weekly buckets and the recency-weighted average
//!
//! Buckets are keyed by ISO year-week (`2024-W07`) and always returned in
//! key order, which is chronological.

use crate::trend::{classify, Trend};
use chrono::NaiveDate;
use dealscope_common::time::iso_week_key;
use dealscope_common::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Meetings and closed deals within one ISO week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyBucket {
    pub period_key: String,
    pub total: u32,
    pub closed: u32,
}

/// Bucket records dated on or before `today` by ISO week
pub fn weekly_buckets(records: &[Record], today: NaiveDate) -> Vec<WeeklyBucket> {
    let mut buckets: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for record in records.iter().filter(|r| r.meeting_date <= today) {
        let entry = buckets.entry(iso_week_key(record.meeting_date)).or_default();
        entry.0 += 1;
        if record.closed {
            entry.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(period_key, (total, closed))| WeeklyBucket {
            period_key,
            total,
            closed,
        })
        .collect()
}

/// The last `n` buckets, still chronological
pub fn last_n(buckets: &[WeeklyBucket], n: usize) -> &[WeeklyBucket] {
    &buckets[buckets.len().saturating_sub(n)..]
}

/// Weighted mean of closed counts
///
/// `recent` is chronological; `weights` run most-recent-first. The sum is
/// normalized by the weights actually paired with a bucket, so fewer
/// buckets than weights still yields a mean.
pub fn weighted_closed(recent: &[WeeklyBucket], weights: &[f64]) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for (bucket, weight) in recent.iter().rev().zip(weights) {
        weighted_sum += bucket.closed as f64 * weight;
        weight_sum += weight;
    }

    if weight_sum == 0.0 {
        0.0
    } else {
        weighted_sum / weight_sum
    }
}

/// Newer half of `recent` against the older half
///
/// With an odd count the middle bucket belongs to the newer half.
pub fn weekly_trend(recent: &[WeeklyBucket], threshold: f64) -> Trend {
    if recent.len() < 2 {
        return Trend::Neutral;
    }
    let split = recent.len() / 2;
    let (older, newer) = recent.split_at(split);
    classify(mean_closed(newer), mean_closed(older), threshold)
}

fn mean_closed(buckets: &[WeeklyBucket]) -> f64 {
    if buckets.is_empty() {
        return 0.0;
    }
    buckets.iter().map(|b| b.closed as f64).sum::<f64>() / buckets.len() as f64
}
