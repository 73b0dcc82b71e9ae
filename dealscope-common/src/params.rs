//! Engine policy parameters
//!
//! Every threshold the engine applies is a named field here. The defaults
//! reproduce the reference classification results; overriding any of them
//! changes externally observable output (which groups are reported as
//! opportunities, which correlations surface, which confidence label a
//! forecast earns).
//!
//! Parameters are loaded from the `[engine]` table of the TOML config; any
//! field left out keeps its default.

use serde::{Deserialize, Serialize};

/// Policy constants for aggregation, correlation and forecasting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Minimum group size before a derived statistic is trusted
    ///
    /// Default: 3
    pub min_reliability_sample: u32,

    /// Decimal places kept on conversion rates and derived percentages
    ///
    /// Default: 2
    pub rate_precision: u32,

    /// Low percentile cut point for volume/conversion thresholds
    ///
    /// Default: 0.33
    pub percentile_low: f64,

    /// High percentile cut point for volume/conversion thresholds
    ///
    /// Default: 0.67
    pub percentile_high: f64,

    /// Percentage-point adjustment used by the conversion threshold fallback
    /// and (doubled) by the relative-to-overall relevance criterion
    ///
    /// Default: 5.0
    pub conversion_adjustment: f64,

    /// Length of the opportunity / needs-strategy lists
    ///
    /// Default: 5
    pub outlier_top_n: usize,

    /// Correlations kept per seller in the narrator payload
    ///
    /// Default: 3
    pub correlation_top_n: usize,

    /// Absolute success rate that always qualifies a correlation
    ///
    /// Default: 70.0
    pub absolute_success_threshold: f64,

    /// Margin over the seller's own average that qualifies a correlation
    ///
    /// Default: 15.0
    pub seller_relative_margin: f64,

    /// Relative change separating stable from moving weekly series
    ///
    /// Default: 0.10
    pub weekly_trend_threshold: f64,

    /// Relative change separating stable from moving month-over-month rates
    ///
    /// Default: 0.05
    pub monthly_trend_threshold: f64,

    /// Coefficient of variation below which a forecast is high confidence
    /// (low confidence starts above twice this value)
    ///
    /// Default: 0.3
    pub low_variance_threshold: f64,

    /// Weekly bucket weights, most recent first
    ///
    /// Default: [0.4, 0.3, 0.2, 0.1]
    pub weekly_weights: Vec<f64>,

    /// Daily-rate multiplier applied under an increasing trend
    ///
    /// Default: 1.05
    pub increasing_multiplier: f64,

    /// Daily-rate multiplier applied under a decreasing trend
    ///
    /// Default: 0.95
    pub decreasing_multiplier: f64,

    /// Window, in days, for the "new industries" list
    ///
    /// Default: 30
    pub new_industry_window_days: u32,
}

impl EngineParams {
    /// Score a correlation must exceed over the overall average
    pub fn overall_relative_margin(&self) -> f64 {
        2.0 * self.conversion_adjustment
    }

    /// Coefficient of variation above which a forecast is low confidence
    pub fn high_variance_threshold(&self) -> f64 {
        2.0 * self.low_variance_threshold
    }

    /// Number of weekly buckets the weighted average looks at
    pub fn weekly_window(&self) -> usize {
        self.weekly_weights.len()
    }

    /// Validate ranges
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.percentile_low)
            || !(0.0..=1.0).contains(&self.percentile_high)
            || self.percentile_low > self.percentile_high
        {
            return Err(crate::Error::Config(format!(
                "Percentile cut points must satisfy 0 <= low <= high <= 1 (got {} / {})",
                self.percentile_low, self.percentile_high
            )));
        }
        if self.weekly_weights.is_empty() || self.weekly_weights.iter().any(|w| *w < 0.0) {
            return Err(crate::Error::Config(
                "weekly_weights must be a non-empty list of non-negative weights".to_string(),
            ));
        }
        if self.low_variance_threshold <= 0.0 {
            return Err(crate::Error::Config(format!(
                "low_variance_threshold must be positive (got {})",
                self.low_variance_threshold
            )));
        }
        Ok(())
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            min_reliability_sample: 3,
            rate_precision: 2,
            percentile_low: 0.33,
            percentile_high: 0.67,
            conversion_adjustment: 5.0,
            outlier_top_n: 5,
            correlation_top_n: 3,
            absolute_success_threshold: 70.0,
            seller_relative_margin: 15.0,
            weekly_trend_threshold: 0.10,
            monthly_trend_threshold: 0.05,
            low_variance_threshold: 0.3,
            weekly_weights: vec![0.4, 0.3, 0.2, 0.1],
            increasing_multiplier: 1.05,
            decreasing_multiplier: 0.95,
            new_industry_window_days: 30,
        }
    }
}
