//! Narrative Payload Builder
//!
//! Shapes engine outputs into the fixed request the insight narrator
//! consumes: a dataset kind tag plus a flat list of summary items.

use crate::aggregator::DimensionGroup;
use crate::correlation::{top_entries, CorrelationEntry, CorrelationReport};
use crate::forecast::{ProjectionResult, TimelineEntry};
use crate::percentile::OutlierReport;
use dealscope_common::Dimension;
use serde::Serialize;

/// Which dataset a request describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Ranking,
    Correlation,
    Forecast,
    Opportunities,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Ranking => "ranking",
            DatasetKind::Correlation => "correlation",
            DatasetKind::Forecast => "forecast",
            DatasetKind::Opportunities => "opportunities",
        }
    }
}

/// Outlier list a dimension summary came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutlierSegment {
    ExpansionOpportunity,
    NeedsStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSummary {
    pub value: String,
    pub count: u32,
    pub closed: u32,
    pub conversion_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<OutlierSegment>,
}

impl DimensionSummary {
    fn from_group(group: &DimensionGroup, segment: Option<OutlierSegment>) -> Self {
        Self {
            value: group.key.clone(),
            count: group.total,
            closed: group.closed,
            conversion_rate: group.conversion_rate,
            segment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationSummary {
    pub dimension: Dimension,
    pub value: String,
    pub total: u32,
    pub success_rate: f64,
    pub seller_avg_conversion: f64,
    pub overall_avg: f64,
    pub performance_vs_avg: f64,
}

impl From<&CorrelationEntry> for CorrelationSummary {
    fn from(entry: &CorrelationEntry) -> Self {
        Self {
            dimension: entry.dimension,
            value: entry.value.clone(),
            total: entry.total,
            success_rate: entry.success_rate,
            seller_avg_conversion: entry.seller_avg_conversion,
            overall_avg: entry.overall_avg,
            performance_vs_avg: entry.performance_vs_avg,
        }
    }
}

/// Placed where a seller's correlation list would be when none survived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Marker {
    NoSignificantCorrelation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SellerFinding {
    Correlations(Vec<CorrelationSummary>),
    Marker(Marker),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerSummary {
    pub seller: String,
    #[serde(flatten)]
    pub finding: SellerFinding,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NarrativeItem {
    Dimension(DimensionSummary),
    Seller(SellerSummary),
    Timeline(TimelineEntry),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeRequest {
    pub kind: DatasetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
    pub items: Vec<NarrativeItem>,
}

impl NarrativeRequest {
    /// Ranking in the order given (callers pass rankings already sorted)
    pub fn ranking(dimension: Dimension, groups: &[DimensionGroup]) -> Self {
        Self {
            kind: DatasetKind::Ranking,
            dimension: Some(dimension),
            items: groups
                .iter()
                .map(|g| NarrativeItem::Dimension(DimensionSummary::from_group(g, None)))
                .collect(),
        }
    }

    /// Top `top_n` correlations per seller, or the no-correlation marker
    pub fn correlation(report: &CorrelationReport, top_n: usize) -> Self {
        let items = report
            .sellers
            .iter()
            .map(|seller| {
                let top = top_entries(seller, top_n);
                let finding = if top.is_empty() {
                    SellerFinding::Marker(Marker::NoSignificantCorrelation)
                } else {
                    SellerFinding::Correlations(top.iter().map(CorrelationSummary::from).collect())
                };
                NarrativeItem::Seller(SellerSummary {
                    seller: seller.seller.clone(),
                    finding,
                })
            })
            .collect();

        Self {
            kind: DatasetKind::Correlation,
            dimension: None,
            items,
        }
    }

    pub fn forecast(projection: &ProjectionResult) -> Self {
        Self {
            kind: DatasetKind::Forecast,
            dimension: None,
            items: projection.timeline.iter().cloned().map(NarrativeItem::Timeline).collect(),
        }
    }

    /// Expansion opportunities first, then groups needing strategy
    pub fn opportunities(dimension: Dimension, outliers: &OutlierReport) -> Self {
        let opportunities = outliers
            .expansion_opportunities
            .iter()
            .map(|g| DimensionSummary::from_group(g, Some(OutlierSegment::ExpansionOpportunity)));
        let strategy = outliers
            .needs_strategy
            .iter()
            .map(|g| DimensionSummary::from_group(g, Some(OutlierSegment::NeedsStrategy)));

        Self {
            kind: DatasetKind::Opportunities,
            dimension: Some(dimension),
            items: opportunities.chain(strategy).map(NarrativeItem::Dimension).collect(),
        }
    }

    pub fn dimension_items(&self) -> impl Iterator<Item = &DimensionSummary> {
        self.items.iter().filter_map(|item| match item {
            NarrativeItem::Dimension(d) => Some(d),
            _ => None,
        })
    }

    pub fn seller_items(&self) -> impl Iterator<Item = &SellerSummary> {
        self.items.iter().filter_map(|item| match item {
            NarrativeItem::Seller(s) => Some(s),
            _ => None,
        })
    }

    pub fn timeline_items(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.items.iter().filter_map(|item| match item {
            NarrativeItem::Timeline(t) => Some(t),
            _ => None,
        })
    }
}
