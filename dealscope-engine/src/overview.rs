//! Descriptive overview: headline KPIs, per-dimension rankings and industries
//! new to the pipeline

use crate::aggregator::{aggregate_dimension, conversion_rate, round_to, DimensionGroup};
use crate::reliability::ReliabilityGate;
use chrono::{Days, NaiveDate};
use dealscope_common::time::format_date;
use dealscope_common::{Dimension, EngineParams, Record};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Headline figures over every fetched record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_meetings: u32,
    pub closed: u32,
    pub conversion_rate: f64,
    pub avg_interaction_volume: Option<f64>,
    pub distinct_sellers: u32,
    /// Records that have been through enrichment
    pub processed: u32,
}

impl Overview {
    pub fn compute(records: &[Record], precision: u32) -> Self {
        let closed = records.iter().filter(|r| r.closed).count() as u32;
        let volumes: Vec<f64> = records.iter().filter_map(|r| r.interaction_volume).collect();
        let sellers: HashSet<&str> = records.iter().filter_map(|r| r.dimension(Dimension::Seller)).collect();
        let total = records.len() as u32;

        Self {
            total_meetings: total,
            closed,
            conversion_rate: conversion_rate(closed, total, precision),
            avg_interaction_volume: (!volumes.is_empty())
                .then(|| round_to(volumes.iter().sum::<f64>() / volumes.len() as f64, precision)),
            distinct_sellers: sellers.len() as u32,
            processed: records.iter().filter(|r| r.processed).count() as u32,
        }
    }
}

/// A ranked group, flagged when its sample passes the reliability gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedGroup {
    #[serde(flatten)]
    pub group: DimensionGroup,
    pub reliable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub dimension: Dimension,
    pub entries: Vec<RankedGroup>,
}

impl Ranking {
    pub fn groups(&self) -> Vec<DimensionGroup> {
        self.entries.iter().map(|e| e.group.clone()).collect()
    }
}

/// Every group of `dimension` by descending conversion rate
///
/// Not gated: small groups stay in the list with `reliable = false`. Ties
/// keep first-seen order.
pub fn rank(records: &[Record], dimension: Dimension, params: &EngineParams) -> Ranking {
    let gate = ReliabilityGate::new(params.min_reliability_sample);
    let mut groups = aggregate_dimension(records, dimension, params.rate_precision).into_vec();
    groups.sort_by(|a, b| b.conversion_rate.total_cmp(&a.conversion_rate));

    Ranking {
        dimension,
        entries: groups
            .into_iter()
            .map(|group| RankedGroup {
                reliable: gate.keep(&group),
                group,
            })
            .collect(),
    }
}

/// Rankings for every dimension, in [`Dimension::ALL`] order
pub fn rankings(records: &[Record], params: &EngineParams) -> Vec<Ranking> {
    Dimension::ALL
        .iter()
        .map(|&dimension| rank(records, dimension, params))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIndustry {
    pub industry: String,
    /// `YYYY-MM-DD`
    pub first_seen: String,
    pub meetings: u32,
}

/// Industries whose earliest meeting falls in `[today - window_days, today]`
///
/// Ordered by first-seen date, then name. Meetings after `today` are ignored.
pub fn new_industries(records: &[Record], today: NaiveDate, window_days: u32) -> Vec<NewIndustry> {
    let window_start = today
        .checked_sub_days(Days::new(window_days as u64))
        .unwrap_or(NaiveDate::MIN);

    let mut seen: HashMap<&str, (NaiveDate, u32)> = HashMap::new();
    for record in records.iter().filter(|r| r.meeting_date <= today) {
        let Some(industry) = record.dimension(Dimension::Industry) else {
            continue;
        };
        let entry = seen.entry(industry).or_insert((record.meeting_date, 0));
        entry.0 = entry.0.min(record.meeting_date);
        entry.1 += 1;
    }

    let mut fresh: Vec<(NaiveDate, &str, u32)> = seen
        .into_iter()
        .filter(|(_, (first, _))| *first >= window_start)
        .map(|(industry, (first, meetings))| (first, industry, meetings))
        .collect();
    fresh.sort();

    fresh
        .into_iter()
        .map(|(first, industry, meetings)| NewIndustry {
            industry: industry.to_string(),
            first_seen: format_date(first),
            meetings,
        })
        .collect()
}
