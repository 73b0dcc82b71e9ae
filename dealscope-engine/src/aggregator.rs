//! Dimension Aggregator
//!
//! Groups records by a categorical key and computes total count, closed
//! count and conversion rate per group.
//!
//! Groups come back in first-seen order. Records whose key is missing are
//! left out of the group set entirely; there is never a "null" group.

use dealscope_common::{Dimension, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregated statistics for one dimension value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionGroup {
    pub key: String,
    pub total: u32,
    pub closed: u32,
    /// `closed / total * 100`, rounded
    pub conversion_rate: f64,
    /// Mean interaction volume over records that report one
    pub avg_interaction_volume: Option<f64>,
}

/// Insertion-ordered set of groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionGroups {
    groups: Vec<DimensionGroup>,
}

impl DimensionGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DimensionGroup> {
        self.groups.iter()
    }

    pub fn get(&self, key: &str) -> Option<&DimensionGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn as_slice(&self) -> &[DimensionGroup] {
        &self.groups
    }

    pub fn into_vec(self) -> Vec<DimensionGroup> {
        self.groups
    }
}

impl From<Vec<DimensionGroup>> for DimensionGroups {
    fn from(groups: Vec<DimensionGroup>) -> Self {
        Self { groups }
    }
}

impl IntoIterator for DimensionGroups {
    type Item = DimensionGroup;
    type IntoIter = std::vec::IntoIter<DimensionGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl<'a> IntoIterator for &'a DimensionGroups {
    type Item = &'a DimensionGroup;
    type IntoIter = std::slice::Iter<'a, DimensionGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[derive(Default)]
struct Accumulator {
    total: u32,
    closed: u32,
    volume_sum: f64,
    volume_count: u32,
}

/// Round `value` to `precision` decimal places (half away from zero)
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Conversion rate in percent, rounded to `precision` decimals
///
/// An empty group has no meaningful rate; it reports 0.0.
pub fn conversion_rate(closed: u32, total: u32, precision: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(closed as f64 / total as f64 * 100.0, precision)
}

/// Group `records` by the key returned from `extract`, keeping only records
/// accepted by `predicate`
pub fn aggregate<'a, E, P>(
    records: &'a [Record],
    extract: E,
    predicate: P,
    precision: u32,
) -> DimensionGroups
where
    E: Fn(&'a Record) -> Option<&'a str>,
    P: Fn(&Record) -> bool,
{
    let mut order: Vec<&'a str> = Vec::new();
    let mut accumulators: HashMap<&'a str, Accumulator> = HashMap::new();

    for record in records.iter().filter(|r| predicate(*r)) {
        let Some(key) = extract(record) else {
            continue;
        };

        let acc = accumulators.entry(key).or_insert_with(|| {
            order.push(key);
            Accumulator::default()
        });
        acc.total += 1;
        if record.closed {
            acc.closed += 1;
        }
        if let Some(volume) = record.interaction_volume {
            acc.volume_sum += volume;
            acc.volume_count += 1;
        }
    }

    let groups = order
        .into_iter()
        .filter_map(|key| {
            let acc = accumulators.remove(key)?;
            Some(DimensionGroup {
                key: key.to_string(),
                total: acc.total,
                closed: acc.closed,
                conversion_rate: conversion_rate(acc.closed, acc.total, precision),
                avg_interaction_volume: (acc.volume_count > 0)
                    .then(|| round_to(acc.volume_sum / acc.volume_count as f64, precision)),
            })
        })
        .collect();

    DimensionGroups { groups }
}

/// Group processed records by `dimension`, skipping records where it is unset
pub fn aggregate_dimension(records: &[Record], dimension: Dimension, precision: u32) -> DimensionGroups {
    let groups = aggregate(
        records,
        |r| r.dimension(dimension),
        |r| r.processed,
        precision,
    );
    tracing::debug!(dimension = %dimension, groups = groups.len(), "Aggregated dimension");
    groups
}
