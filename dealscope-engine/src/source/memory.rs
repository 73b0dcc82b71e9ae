//! In-memory record source

use super::{RecordQuery, RecordSource};
use async_trait::async_trait;
use dealscope_common::{Record, Result};

/// Serves a fixed record list, filtered per query
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<Record>,
}

impl InMemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        Ok(self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }
}
