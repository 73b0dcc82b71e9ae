//! Database pool and record table
//!
//! The engine only reads meeting records. Schema creation and the insert
//! helper exist so a fresh database (or a test fixture) can be populated.

use crate::time::format_date;
use crate::{Record, Result};
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the SQLite database and ensure the `meetings` table exists
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the `meetings` table and its date index if missing
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meetings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            seller TEXT,
            industry TEXT,
            sentiment TEXT,
            urgency TEXT,
            discovery_source TEXT,
            operation_size TEXT,
            interaction_volume REAL,
            closed INTEGER NOT NULL DEFAULT 0,
            meeting_date TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_meetings_date ON meetings(meeting_date)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert one record, returning its row id
///
/// `record.id` is ignored; SQLite assigns the key.
pub async fn insert_record(pool: &SqlitePool, record: &Record) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO meetings (
            seller, industry, sentiment, urgency, discovery_source, operation_size,
            interaction_volume, closed, meeting_date, processed
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.seller.as_deref())
    .bind(record.industry.as_deref())
    .bind(record.sentiment.as_deref())
    .bind(record.urgency.as_deref())
    .bind(record.discovery_source.as_deref())
    .bind(record.operation_size.as_deref())
    .bind(record.interaction_volume)
    .bind(record.closed as i64)
    .bind(format_date(record.meeting_date))
    .bind(record.processed as i64)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_table_and_inserts() {
        let dir = TempDir::new().unwrap();
        let pool = init_database_pool(&dir.path().join("nested").join("test.db"))
            .await
            .expect("Should create database");

        let record = Record::new(0, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()).with_closed(true);
        let first = insert_record(&pool, &record).await.unwrap();
        let second = insert_record(&pool, &record).await.unwrap();
        assert!(second > first);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meetings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_init_tables_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let pool = init_database_pool(&dir.path().join("test.db")).await.unwrap();
        init_tables(&pool).await.expect("Second init should succeed");
    }
}
