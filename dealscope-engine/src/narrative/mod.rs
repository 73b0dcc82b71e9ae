//! Narratives for each report section
//!
//! Every section gets prose: the narrator's text when it answers, otherwise
//! a deterministic sentence assembled from the same numbers.

pub mod narrator;
pub mod payload;

pub use narrator::{DisabledNarrator, HttpNarrator, Narrator, NarratorError};
pub use payload::{DatasetKind, NarrativeItem, NarrativeRequest, SellerFinding};

use crate::forecast::Period;
use serde::Serialize;

/// Narrative for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NarrativeOutcome {
    /// Narrator text
    Ok { text: String },
    /// Local fallback text, with why the narrator was not used
    Degraded { text: String, reason: String },
}

impl NarrativeOutcome {
    pub fn text(&self) -> &str {
        match self {
            NarrativeOutcome::Ok { text } | NarrativeOutcome::Degraded { text, .. } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, NarrativeOutcome::Degraded { .. })
    }
}

/// Ask `narrator`, falling back to [`fallback_text`] on any error
pub async fn narrate_or_fallback(narrator: &dyn Narrator, request: &NarrativeRequest) -> NarrativeOutcome {
    match narrator.narrate(request).await {
        Ok(text) => NarrativeOutcome::Ok { text },
        Err(NarratorError::NotConfigured) => {
            tracing::debug!(kind = request.kind.as_str(), "No narrator configured, using fallback text");
            NarrativeOutcome::Degraded {
                text: fallback_text(request),
                reason: NarratorError::NotConfigured.to_string(),
            }
        }
        Err(e) => {
            tracing::warn!(
                narrator = narrator.name(),
                kind = request.kind.as_str(),
                error = %e,
                "Narrator failed, using fallback text"
            );
            NarrativeOutcome::Degraded {
                text: fallback_text(request),
                reason: e.to_string(),
            }
        }
    }
}

/// Deterministic narrative built only from the request's numbers
pub fn fallback_text(request: &NarrativeRequest) -> String {
    match request.kind {
        DatasetKind::Ranking => ranking_text(request),
        DatasetKind::Correlation => correlation_text(request),
        DatasetKind::Forecast => forecast_text(request),
        DatasetKind::Opportunities => opportunities_text(request),
    }
}

fn subject(request: &NarrativeRequest) -> &'static str {
    request.dimension.map(|d| d.as_str()).unwrap_or("segment")
}

fn ranking_text(request: &NarrativeRequest) -> String {
    let items: Vec<_> = request.dimension_items().collect();
    let (Some(first), Some(last)) = (items.first(), items.last()) else {
        return format!("No {} ranking data available.", subject(request));
    };

    let mut text = format!(
        "{} leads by {} with a {:.2}% conversion rate over {} meetings.",
        first.value,
        subject(request),
        first.conversion_rate,
        first.count
    );
    if items.len() > 1 {
        text.push_str(&format!(
            " {} trails at {:.2}% over {} meetings.",
            last.value, last.conversion_rate, last.count
        ));
    }
    text
}

fn correlation_text(request: &NarrativeRequest) -> String {
    let mut best: Option<(&str, &payload::CorrelationSummary)> = None;
    let mut with_findings = 0;
    for seller in request.seller_items() {
        let SellerFinding::Correlations(entries) = &seller.finding else {
            continue;
        };
        with_findings += 1;
        for entry in entries {
            if best.map_or(true, |(_, b)| entry.success_rate > b.success_rate) {
                best = Some((seller.seller.as_str(), entry));
            }
        }
    }

    match best {
        None => "No significant seller correlations were found.".to_string(),
        Some((seller, entry)) => format!(
            "{} of {} sellers show significant correlations. Strongest: {} converts {:.2}% when {} is {}, {:+.2} points against the overall average.",
            with_findings,
            request.items.len(),
            seller,
            entry.success_rate,
            entry.dimension,
            entry.value,
            entry.performance_vs_avg
        ),
    }
}

fn forecast_text(request: &NarrativeRequest) -> String {
    let projected: Vec<_> = request
        .timeline_items()
        .filter(|t| t.period == Period::Projected)
        .collect();
    if projected.is_empty() {
        return crate::forecast::INSUFFICIENT_DATA_MESSAGE.to_string();
    }

    let meetings: f64 = projected.iter().map(|t| t.meetings).sum();
    let closed: f64 = projected.iter().map(|t| t.closed).sum();
    format!(
        "Over the next {} days, about {:.0} closed deals from {:.0} meetings are projected.",
        projected.len(),
        closed,
        meetings
    )
}

fn opportunities_text(request: &NarrativeRequest) -> String {
    use payload::OutlierSegment;

    let items: Vec<_> = request.dimension_items().collect();
    let opportunities: Vec<_> = items
        .iter()
        .filter(|d| d.segment == Some(OutlierSegment::ExpansionOpportunity))
        .collect();
    let strategy: Vec<_> = items
        .iter()
        .filter(|d| d.segment == Some(OutlierSegment::NeedsStrategy))
        .collect();

    if items.is_empty() {
        return format!("No {} stands out as an opportunity or a concern.", subject(request));
    }

    let mut parts = Vec::new();
    if let Some(best) = opportunities.first() {
        parts.push(format!(
            "{} expansion opportunities, led by {} at {:.2}% over {} meetings.",
            opportunities.len(),
            best.value,
            best.conversion_rate,
            best.count
        ));
    }
    if let Some(largest) = strategy.first() {
        parts.push(format!(
            "{} segments need a new strategy, the largest being {} at {:.2}% over {} meetings.",
            strategy.len(),
            largest.value,
            largest.conversion_rate,
            largest.count
        ));
    }
    parts.join(" ")
}
