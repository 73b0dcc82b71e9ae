//! Reliability Gate
//!
//! Drops aggregated groups whose sample size is below the configured minimum
//! before they feed any derived statistic (percentile thresholds,
//! correlation baselines, seller breakdowns).

use crate::aggregator::{DimensionGroup, DimensionGroups};

/// Minimum-sample filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReliabilityGate {
    min_sample: u32,
}

impl ReliabilityGate {
    pub fn new(min_sample: u32) -> Self {
        Self { min_sample }
    }

    pub fn min_sample(&self) -> u32 {
        self.min_sample
    }

    /// `true` when the group is large enough to trust
    pub fn keep(&self, group: &DimensionGroup) -> bool {
        group.total >= self.min_sample
    }

    /// Groups passing the gate, order preserved
    pub fn apply(&self, groups: DimensionGroups) -> DimensionGroups {
        let before = groups.len();
        let kept: Vec<DimensionGroup> = groups.into_iter().filter(|g| self.keep(g)).collect();

        if kept.len() < before {
            tracing::trace!(
                min_sample = self.min_sample,
                dropped = before - kept.len(),
                kept = kept.len(),
                "Reliability gate dropped small groups"
            );
        }

        DimensionGroups::from(kept)
    }
}

impl Default for ReliabilityGate {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(key: &str, total: u32, closed: u32) -> DimensionGroup {
        DimensionGroup {
            key: key.to_string(),
            total,
            closed,
            conversion_rate: crate::aggregator::conversion_rate(closed, total, 2),
            avg_interaction_volume: None,
        }
    }

    #[test]
    fn test_keep_boundary() {
        let gate = ReliabilityGate::new(3);
        assert!(!gate.keep(&group("a", 2, 2)));
        assert!(gate.keep(&group("b", 3, 0)));
        assert!(gate.keep(&group("c", 10, 4)));
    }

    #[test]
    fn test_apply_preserves_order() {
        let gate = ReliabilityGate::default();
        let groups = DimensionGroups::from(vec![
            group("small", 1, 1),
            group("big", 8, 2),
            group("edge", 3, 3),
            group("tiny", 2, 0),
        ]);

        let kept: Vec<_> = gate.apply(groups).into_iter().map(|g| g.key).collect();
        assert_eq!(kept, vec!["big", "edge"]);
    }

    #[test]
    fn test_nothing_survives() {
        let gate = ReliabilityGate::new(5);
        let groups = DimensionGroups::from(vec![group("a", 4, 4)]);
        assert!(gate.apply(groups).is_empty());
    }
}
