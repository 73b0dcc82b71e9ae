//! SQLite record source over the `meetings` table

use super::{RecordQuery, RecordSource};
use async_trait::async_trait;
use dealscope_common::time::{format_date, parse_date};
use dealscope_common::{Dimension, Record, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const SELECT_MEETINGS: &str = r#"
    SELECT id, seller, industry, sentiment, urgency, discovery_source,
           operation_size, interaction_volume, closed, meeting_date, processed
    FROM meetings
"#;

/// Reads meeting records with sqlx
#[derive(Clone)]
pub struct SqliteSource {
    pool: SqlitePool,
}

impl SqliteSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Column backing a dimension
fn column(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Seller => "seller",
        Dimension::Industry => "industry",
        Dimension::Sentiment => "sentiment",
        Dimension::Urgency => "urgency",
        Dimension::DiscoverySource => "discovery_source",
        Dimension::OperationSize => "operation_size",
    }
}

/// WHERE clause for `query` plus the date binds in order
fn where_clause(query: &RecordQuery) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(since) = query.since {
        conditions.push("meeting_date >= ?".to_string());
        binds.push(format_date(since));
    }
    if let Some(until) = query.until {
        conditions.push("meeting_date <= ?".to_string());
        binds.push(format_date(until));
    }
    if query.processed_only {
        conditions.push("processed != 0".to_string());
    }
    if let Some(dimension) = query.require_dimension {
        let col = column(dimension);
        conditions.push(format!("{col} IS NOT NULL AND TRIM({col}) != ''"));
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), binds)
    }
}

fn record_from_row(row: &SqliteRow) -> Result<Record> {
    let meeting_date: String = row.try_get("meeting_date")?;
    let closed: i64 = row.try_get("closed")?;
    let processed: i64 = row.try_get("processed")?;

    Ok(Record {
        id: row.try_get("id")?,
        seller: row.try_get("seller")?,
        industry: row.try_get("industry")?,
        sentiment: row.try_get("sentiment")?,
        urgency: row.try_get("urgency")?,
        discovery_source: row.try_get("discovery_source")?,
        operation_size: row.try_get("operation_size")?,
        interaction_volume: row.try_get("interaction_volume")?,
        closed: closed != 0,
        meeting_date: parse_date(&meeting_date)?,
        processed: processed != 0,
    })
}

#[async_trait]
impl RecordSource for SqliteSource {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn fetch(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        let (filter, binds) = where_clause(query);
        let sql = format!("{SELECT_MEETINGS} {filter} ORDER BY meeting_date, id");

        let mut statement = sqlx::query(&sql);
        for value in &binds {
            statement = statement.bind(value);
        }
        let rows = statement.fetch_all(&self.pool).await?;

        let records = rows.iter().map(record_from_row).collect::<Result<Vec<_>>>()?;
        tracing::debug!(rows = records.len(), ?query, "Fetched meeting records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_where_clause() {
        let (clause, binds) = where_clause(&RecordQuery::all());
        assert!(clause.is_empty());
        assert!(binds.is_empty());

        let query = RecordQuery {
            since: NaiveDate::from_ymd_opt(2024, 1, 1),
            until: None,
            processed_only: true,
            require_dimension: Some(Dimension::DiscoverySource),
        };
        let (clause, binds) = where_clause(&query);
        assert_eq!(
            clause,
            "WHERE meeting_date >= ? AND processed != 0 AND discovery_source IS NOT NULL AND TRIM(discovery_source) != ''"
        );
        assert_eq!(binds, vec!["2024-01-01".to_string()]);
    }
}
