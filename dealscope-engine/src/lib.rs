//! dealscope-engine library interface
//!
//! Statistical aggregation, correlation and forecasting over historical
//! sales-meeting records, plus the adapters that feed it (record sources)
//! and consume it (insight narrator).
//!
//! Data flows strictly downward:
//! aggregator → reliability gate → {percentile engine, correlation} →
//! forecast → narrative payload.

pub mod aggregator;
pub mod correlation;
pub mod forecast;
pub mod narrative;
pub mod overview;
pub mod percentile;
pub mod reliability;
pub mod report;
pub mod source;
pub mod trend;

pub use aggregator::{aggregate, aggregate_dimension, DimensionGroup, DimensionGroups};
pub use correlation::{CorrelationEntry, CorrelationReport, SellerCorrelation};
pub use forecast::{Confidence, ProjectionResult};
pub use narrative::{NarrativeOutcome, NarrativeRequest, Narrator};
pub use percentile::OutlierReport;
pub use report::{Analysis, Engine, Report};
pub use source::{RecordQuery, RecordSource};
pub use trend::Trend;
