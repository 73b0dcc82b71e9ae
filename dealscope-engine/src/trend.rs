//! Trend Classifier
//!
//! Compares a current value against a previous one using a relative-change
//! threshold. A zero baseline has no defined percentage change: moving from
//! zero to anything positive is `Increasing`, staying at zero is `Neutral`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    Neutral,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
            Trend::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `current` against `previous`
///
/// `threshold` is a fraction (0.10 = 10%); the comparison is strict on both
/// sides, so a change of exactly `threshold` is `Stable`.
pub fn classify(current: f64, previous: f64, threshold: f64) -> Trend {
    if previous == 0.0 {
        return if current > 0.0 {
            Trend::Increasing
        } else {
            Trend::Neutral
        };
    }

    let change = (current - previous) / previous;
    if change > threshold {
        Trend::Increasing
    } else if change < -threshold {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Percentage change from `previous` to `current`; `None` on a zero baseline
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}
