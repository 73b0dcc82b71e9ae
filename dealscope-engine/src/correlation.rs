//! Correlation Analyzer
//!
//! Cross-tabulates each seller's results against the other dimensions and
//! keeps only correlations that are both reliable and relevant.
//!
//! # Algorithm
//! 1. Baseline: overall conversion rate per (dimension, value), gated
//! 2. Per seller: own conversion rate over all their records (ungated)
//! 3. Per seller and dimension: breakdown by value, gated at seller scope
//! 4. Keep an entry when at least one relevance criterion holds:
//!    - `success_rate >= absolute_success_threshold` (70)
//!    - `success_rate > seller_avg + seller_relative_margin` (+15)
//!    - `success_rate > overall_avg + 2 * conversion_adjustment` (+10)

use crate::aggregator::{aggregate, aggregate_dimension, round_to};
use crate::reliability::ReliabilityGate;
use dealscope_common::{Dimension, EngineParams, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reason a correlation was surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relevance {
    /// Absolute high performer
    AbsoluteHigh,
    /// Well above the seller's own average
    AboveSellerAverage,
    /// Well above the overall average for this value
    AboveOverallAverage,
}

/// One seller × dimension-value correlation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationEntry {
    pub seller: String,
    pub dimension: Dimension,
    pub value: String,
    pub total: u32,
    pub closed: u32,
    pub success_rate: f64,
    pub seller_avg_conversion: f64,
    pub overall_avg: f64,
    /// `success_rate - overall_avg`
    pub performance_vs_avg: f64,
    pub relevance: Vec<Relevance>,
}

/// All surfaced correlations for one seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerCorrelation {
    pub seller: String,
    pub total: u32,
    pub closed: u32,
    pub seller_avg_conversion: f64,
    pub entries: Vec<CorrelationEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationReport {
    pub sellers: Vec<SellerCorrelation>,
}

impl CorrelationReport {
    pub fn entry_count(&self) -> usize {
        self.sellers.iter().map(|s| s.entries.len()).sum()
    }
}

/// Overall conversion rate per (dimension, value), reliable values only
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    rates: HashMap<(Dimension, String), f64>,
}

impl Baseline {
    pub fn build(records: &[Record], dimensions: &[Dimension], gate: &ReliabilityGate, precision: u32) -> Self {
        let mut rates = HashMap::new();
        for &dimension in dimensions {
            let groups = gate.apply(aggregate_dimension(records, dimension, precision));
            for group in groups {
                rates.insert((dimension, group.key), group.conversion_rate);
            }
        }
        Self { rates }
    }

    pub fn get(&self, dimension: Dimension, value: &str) -> Option<f64> {
        self.rates.get(&(dimension, value.to_string())).copied()
    }
}

/// Relevance criteria met by a success rate (empty = not relevant)
pub fn relevance(success_rate: f64, seller_avg: f64, overall_avg: f64, params: &EngineParams) -> Vec<Relevance> {
    let mut matched = Vec::new();
    if success_rate >= params.absolute_success_threshold {
        matched.push(Relevance::AbsoluteHigh);
    }
    if success_rate > seller_avg + params.seller_relative_margin {
        matched.push(Relevance::AboveSellerAverage);
    }
    if success_rate > overall_avg + params.overall_relative_margin() {
        matched.push(Relevance::AboveOverallAverage);
    }
    matched
}

/// Run the analyzer over the correlated dimensions
pub fn analyze(records: &[Record], params: &EngineParams) -> CorrelationReport {
    analyze_dimensions(records, &Dimension::CORRELATED, params)
}

/// Run the analyzer over an explicit dimension list
pub fn analyze_dimensions(records: &[Record], dimensions: &[Dimension], params: &EngineParams) -> CorrelationReport {
    let precision = params.rate_precision;
    let gate = ReliabilityGate::new(params.min_reliability_sample);
    let baseline = Baseline::build(records, dimensions, &gate, precision);

    let sellers = aggregate_dimension(records, Dimension::Seller, precision);
    let mut report = CorrelationReport::default();

    for seller in sellers {
        let seller_records: Vec<Record> = records
            .iter()
            .filter(|r| r.processed && r.dimension(Dimension::Seller) == Some(seller.key.as_str()))
            .cloned()
            .collect();

        let mut entries = Vec::new();
        for &dimension in dimensions {
            let breakdown = gate.apply(aggregate(
                &seller_records,
                |r| r.dimension(dimension),
                |_| true,
                precision,
            ));

            for group in breakdown {
                // A value reliable for one seller is reliable overall
                let Some(overall_avg) = baseline.get(dimension, &group.key) else {
                    continue;
                };

                let matched = relevance(group.conversion_rate, seller.conversion_rate, overall_avg, params);
                if matched.is_empty() {
                    continue;
                }

                entries.push(CorrelationEntry {
                    seller: seller.key.clone(),
                    dimension,
                    value: group.key,
                    total: group.total,
                    closed: group.closed,
                    success_rate: group.conversion_rate,
                    seller_avg_conversion: seller.conversion_rate,
                    overall_avg,
                    performance_vs_avg: round_to(group.conversion_rate - overall_avg, precision),
                    relevance: matched,
                });
            }
        }

        tracing::debug!(
            seller = %seller.key,
            records = seller.total,
            correlations = entries.len(),
            "Analyzed seller correlations"
        );

        report.sellers.push(SellerCorrelation {
            seller: seller.key,
            total: seller.total,
            closed: seller.closed,
            seller_avg_conversion: seller.conversion_rate,
            entries,
        });
    }

    report
}

/// Top `n` entries by success rate; ties keep analyzer order
pub fn top_entries(seller: &SellerCorrelation, n: usize) -> Vec<CorrelationEntry> {
    let mut entries = seller.entries.clone();
    entries.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn meeting(id: i64, seller: &str, industry: &str, closed: bool) -> Record {
        Record::new(id, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .with_dimension(Dimension::Seller, seller)
            .with_dimension(Dimension::Industry, industry)
            .with_closed(closed)
    }

    fn repeat(out: &mut Vec<Record>, seller: &str, industry: &str, closed: usize, open: usize) {
        for _ in 0..closed {
            let id = out.len() as i64;
            out.push(meeting(id, seller, industry, true));
        }
        for _ in 0..open {
            let id = out.len() as i64;
            out.push(meeting(id, seller, industry, false));
        }
    }

    #[test]
    fn test_relevance_criteria() {
        let params = EngineParams::default();
        assert_eq!(relevance(70.0, 90.0, 90.0, &params), vec![Relevance::AbsoluteHigh]);
        assert_eq!(relevance(50.0, 34.0, 60.0, &params), vec![Relevance::AboveSellerAverage]);
        assert_eq!(relevance(50.0, 40.0, 39.0, &params), vec![Relevance::AboveOverallAverage]);
        // boundaries on the relative criteria are strict
        assert!(relevance(50.0, 35.0, 40.0, &params).is_empty());
    }

    #[test]
    fn test_absolute_high_performer_is_surfaced() {
        let mut records = Vec::new();
        repeat(&mut records, "Ana", "Tech", 3, 1); // 75% in Tech
        repeat(&mut records, "Ana", "Retail", 3, 0);
        repeat(&mut records, "Bob", "Tech", 1, 3);

        let report = analyze(&records, &EngineParams::default());
        let ana = report.sellers.iter().find(|s| s.seller == "Ana").unwrap();
        let tech = ana.entries.iter().find(|e| e.value == "Tech").unwrap();
        assert_eq!(tech.success_rate, 75.0);
        assert_eq!(tech.overall_avg, 50.0);
        assert_eq!(tech.performance_vs_avg, 25.0);
        assert!(tech.relevance.contains(&Relevance::AbsoluteHigh));
        assert!(tech.relevance.contains(&Relevance::AboveOverallAverage));
    }

    #[test]
    fn test_every_entry_passes_gate() {
        let mut records = Vec::new();
        repeat(&mut records, "Ana", "Tech", 2, 0); // only 2 samples
        repeat(&mut records, "Ana", "Retail", 4, 0);
        repeat(&mut records, "Bob", "Tech", 2, 2);

        let report = analyze(&records, &EngineParams::default());
        for seller in &report.sellers {
            for entry in &seller.entries {
                assert!(entry.total >= 3, "entry {:?} below gate", entry);
            }
        }
        let ana = report.sellers.iter().find(|s| s.seller == "Ana").unwrap();
        assert!(ana.entries.iter().all(|e| e.value != "Tech"));
    }

    #[test]
    fn test_seller_average_is_ungated() {
        let mut records = Vec::new();
        repeat(&mut records, "Cy", "Tech", 1, 1);
        let report = analyze(&records, &EngineParams::default());
        let cy = &report.sellers[0];
        assert_eq!(cy.total, 2);
        assert_eq!(cy.seller_avg_conversion, 50.0);
        assert!(cy.entries.is_empty());
    }

    #[test]
    fn test_average_performer_has_no_entries() {
        let mut records = Vec::new();
        repeat(&mut records, "Ana", "Tech", 2, 2);
        repeat(&mut records, "Bob", "Tech", 2, 2);

        let report = analyze(&records, &EngineParams::default());
        assert_eq!(report.entry_count(), 0);
        assert_eq!(report.sellers.len(), 2);
    }

    #[test]
    fn test_top_entries_orders_by_success_rate() {
        let mut records = Vec::new();
        for (industry, closed, open) in [("A", 3, 1), ("B", 4, 0), ("C", 3, 0), ("D", 5, 2)] {
            repeat(&mut records, "Ana", industry, closed, open);
        }

        let report = analyze(&records, &EngineParams::default());
        let top = top_entries(&report.sellers[0], 3);
        let values: Vec<_> = top.iter().map(|e| e.value.as_str()).collect();
        // B and C tie at 100%, B was seen first
        assert_eq!(values, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_unprocessed_records_do_not_count() {
        let mut records = Vec::new();
        repeat(&mut records, "Ana", "Tech", 3, 0);
        for r in records.iter_mut() {
            r.processed = false;
        }
        let report = analyze(&records, &EngineParams::default());
        assert!(report.sellers.is_empty());
    }
}
