//! Percentile Threshold Engine
//!
//! Derives low/high cut points for group volume and conversion rate, then
//! classifies outlier groups:
//!
//! - **Expansion opportunity**: low volume, high conversion
//!   (`total <= low_volume AND conversion_rate >= high_conversion`)
//! - **Needs strategy**: high volume, low conversion
//!   (`total >= high_volume AND conversion_rate <= low_conversion`)
//!
//! Only groups that pass the reliability gate take part. Cut points come
//! from `sorted[floor(n * p)]`; with fewer than [`MIN_PERCENTILE_POINTS`]
//! surviving groups the volume cut points fall back to the median volume and
//! the conversion cut points to `clamp(avg ± adjustment, min, max)`.

use crate::aggregator::{DimensionGroup, DimensionGroups};
use crate::reliability::ReliabilityGate;
use dealscope_common::EngineParams;
use serde::{Deserialize, Serialize};

/// Fewest values from which percentile cut points are taken
pub const MIN_PERCENTILE_POINTS: usize = 2;

/// How a set of thresholds was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdSource {
    /// Indexed into the sorted arrays
    Percentile,
    /// Median volume and adjusted average conversion
    Fallback,
    /// No group survived the gate
    Empty,
}

/// Volume and conversion cut points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub low_volume: f64,
    pub high_volume: f64,
    pub low_conversion: f64,
    pub high_conversion: f64,
    pub source: ThresholdSource,
}

impl Thresholds {
    fn empty() -> Self {
        Self {
            low_volume: 0.0,
            high_volume: 0.0,
            low_conversion: 0.0,
            high_conversion: 0.0,
            source: ThresholdSource::Empty,
        }
    }
}

/// Outlier classification over one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierReport {
    pub thresholds: Thresholds,
    /// Low-volume / high-conversion groups, best conversion first
    pub expansion_opportunities: Vec<DimensionGroup>,
    /// High-volume / low-conversion groups, largest first
    pub needs_strategy: Vec<DimensionGroup>,
    /// Groups that passed the reliability gate
    pub groups_considered: usize,
}

impl Default for OutlierReport {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::empty(),
            expansion_opportunities: Vec::new(),
            needs_strategy: Vec::new(),
            groups_considered: 0,
        }
    }
}

/// Value at index `floor(n * p)` of an ascending slice
pub fn percentile_value(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let index = ((sorted.len() as f64) * p).floor() as usize;
    Some(sorted[index.min(sorted.len() - 1)])
}

/// Median of an ascending slice (mean of the middle pair for even lengths)
pub fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

fn sorted_values(groups: &[DimensionGroup], value: impl Fn(&DimensionGroup) -> f64) -> Vec<f64> {
    let mut values: Vec<f64> = groups.iter().map(value).collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Cut points for gated `groups`
pub fn derive_thresholds(groups: &[DimensionGroup], params: &EngineParams) -> Thresholds {
    let volumes = sorted_values(groups, |g| g.total as f64);
    let rates = sorted_values(groups, |g| g.conversion_rate);

    if volumes.is_empty() {
        return Thresholds::empty();
    }

    if volumes.len() >= MIN_PERCENTILE_POINTS {
        // Both arrays share one length, so every lookup below is Some
        return Thresholds {
            low_volume: percentile_value(&volumes, params.percentile_low).unwrap_or_default(),
            high_volume: percentile_value(&volumes, params.percentile_high).unwrap_or_default(),
            low_conversion: percentile_value(&rates, params.percentile_low).unwrap_or_default(),
            high_conversion: percentile_value(&rates, params.percentile_high).unwrap_or_default(),
            source: ThresholdSource::Percentile,
        };
    }

    let median_volume = median(&volumes).unwrap_or_default();
    let min_rate = rates[0];
    let max_rate = rates[rates.len() - 1];
    let avg_rate = rates.iter().sum::<f64>() / rates.len() as f64;
    let adjustment = params.conversion_adjustment;

    Thresholds {
        low_volume: median_volume,
        high_volume: median_volume,
        low_conversion: (avg_rate - adjustment).clamp(min_rate, max_rate),
        high_conversion: (avg_rate + adjustment).clamp(min_rate, max_rate),
        source: ThresholdSource::Fallback,
    }
}

/// Gate `groups`, derive thresholds, and pick the outlier lists
pub fn classify_outliers(
    groups: DimensionGroups,
    gate: &ReliabilityGate,
    params: &EngineParams,
) -> OutlierReport {
    let reliable = gate.apply(groups);
    let thresholds = derive_thresholds(reliable.as_slice(), params);

    let mut expansion_opportunities: Vec<DimensionGroup> = reliable
        .iter()
        .filter(|g| {
            (g.total as f64) <= thresholds.low_volume && g.conversion_rate >= thresholds.high_conversion
        })
        .cloned()
        .collect();
    let mut needs_strategy: Vec<DimensionGroup> = reliable
        .iter()
        .filter(|g| {
            (g.total as f64) >= thresholds.high_volume && g.conversion_rate <= thresholds.low_conversion
        })
        .cloned()
        .collect();

    // Stable sorts: ties keep first-seen order
    expansion_opportunities.sort_by(|a, b| b.conversion_rate.total_cmp(&a.conversion_rate));
    needs_strategy.sort_by(|a, b| b.total.cmp(&a.total));
    expansion_opportunities.truncate(params.outlier_top_n);
    needs_strategy.truncate(params.outlier_top_n);

    tracing::debug!(
        considered = reliable.len(),
        source = ?thresholds.source,
        opportunities = expansion_opportunities.len(),
        needs_strategy = needs_strategy.len(),
        "Classified outlier groups"
    );

    OutlierReport {
        groups_considered: reliable.len(),
        thresholds,
        expansion_opportunities,
        needs_strategy,
    }
}
