//! Variance-derived forecast confidence

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// `std_dev / mean` using the population variance
///
/// A zero mean (or no values) yields 1.0, which always maps to low confidence
/// under the default thresholds.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 1.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// `High` below `low_variance_threshold`, `Low` above twice it, else `Medium`
pub fn confidence_from_cv(cv: f64, low_variance_threshold: f64) -> Confidence {
    if cv < low_variance_threshold {
        Confidence::High
    } else if cv > 2.0 * low_variance_threshold {
        Confidence::Low
    } else {
        Confidence::Medium
    }
}
