//! Record sources
//!
//! The engine computes over one immutable snapshot per invocation. A
//! [`RecordSource`] produces that snapshot; fetching is the only I/O the
//! engine performs on the input side.

pub mod memory;
pub mod sqlite;

pub use memory::InMemorySource;
pub use sqlite::SqliteSource;

use async_trait::async_trait;
use chrono::NaiveDate;
use dealscope_common::{Dimension, Record, Result};
use serde::{Deserialize, Serialize};

/// Snapshot filter
///
/// Date bounds are inclusive. The default selects every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub processed_only: bool,
    /// Only records where this dimension is set (non-blank)
    pub require_dimension: Option<Dimension>,
}

impl RecordQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(since: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        Self {
            since,
            until,
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.since.is_some_and(|since| record.meeting_date < since) {
            return false;
        }
        if self.until.is_some_and(|until| record.meeting_date > until) {
            return false;
        }
        if self.processed_only && !record.processed {
            return false;
        }
        match self.require_dimension {
            Some(dimension) => record.dimension(dimension).is_some(),
            None => true,
        }
    }
}

/// Supplies record snapshots to the engine
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &'static str;

    async fn fetch(&self, query: &RecordQuery) -> Result<Vec<Record>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_query_matches_everything() {
        let record = Record::new(1, date(2024, 1, 1)).with_processed(false);
        assert!(RecordQuery::all().matches(&record));
    }

    #[test]
    fn test_date_bounds_inclusive() {
        let query = RecordQuery::between(Some(date(2024, 1, 10)), Some(date(2024, 1, 20)));
        assert!(query.matches(&Record::new(1, date(2024, 1, 10))));
        assert!(query.matches(&Record::new(2, date(2024, 1, 20))));
        assert!(!query.matches(&Record::new(3, date(2024, 1, 9))));
        assert!(!query.matches(&Record::new(4, date(2024, 1, 21))));
    }

    #[test]
    fn test_processed_and_dimension_filters() {
        let query = RecordQuery {
            processed_only: true,
            require_dimension: Some(Dimension::Industry),
            ..RecordQuery::default()
        };
        let base = Record::new(1, date(2024, 1, 1));
        assert!(!query.matches(&base));
        assert!(query.matches(&base.clone().with_dimension(Dimension::Industry, "Tech")));
        assert!(!query.matches(&base.clone().with_dimension(Dimension::Industry, "  ")));
        assert!(!query.matches(
            &base
                .with_dimension(Dimension::Industry, "Tech")
                .with_processed(false)
        ));
    }
}
