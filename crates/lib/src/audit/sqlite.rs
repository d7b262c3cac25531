//! SQLite-backed audit store.

use crate::audit::{AuditRecord, AuditStats, AuditStore, MessageCategory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Audit store over a SQLite file; creates the file and schema if missing.
#[derive(Clone)]
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        log::info!("opening audit database at {}", path.display());
        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(path);
        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id TEXT NOT NULL,
                message_text TEXT NOT NULL,
                category TEXT NOT NULL,
                media_reference TEXT,
                timestamp TEXT NOT NULL,
                response_text TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_audit_sender ON audit_records(sender_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_audit_category ON audit_records(category)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Most recent records, newest first. Operator-facing; the request path
    /// never reads the log.
    pub async fn recent(&self, limit: u32) -> Result<Vec<AuditRecord>, sqlx::Error> {
        let rows: Vec<(String, String, String, Option<String>, DateTime<Utc>, String)> =
            sqlx::query_as(
                r#"
                SELECT sender_id, message_text, category, media_reference, timestamp, response_text
                FROM audit_records ORDER BY id DESC LIMIT ?
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(
                |(sender_id, message_text, category, media_reference, timestamp, response_text)| {
                    AuditRecord {
                        sender_id,
                        message_text,
                        category: MessageCategory::parse(&category)
                            .unwrap_or(MessageCategory::Text),
                        media_reference,
                        timestamp,
                        response_text,
                    }
                },
            )
            .collect())
    }

    async fn count_where(&self, category: Option<MessageCategory>) -> Result<i64, sqlx::Error> {
        let row: (i64,) = match category {
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM audit_records")
                    .fetch_one(&self.pool)
                    .await?
            }
            Some(c) => {
                sqlx::query_as("SELECT COUNT(*) FROM audit_records WHERE category = ?")
                    .bind(c.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.0)
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn insert(&self, record: AuditRecord) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO audit_records (sender_id, message_text, category, media_reference, timestamp, response_text)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.sender_id)
        .bind(&record.message_text)
        .bind(record.category.as_str())
        .bind(&record.media_reference)
        .bind(record.timestamp)
        .bind(&record.response_text)
        .execute(&self.pool)
        .await
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn stats(&self) -> Result<AuditStats, String> {
        let total = self.count_where(None).await.map_err(|e| e.to_string())?;
        let text = self
            .count_where(Some(MessageCategory::Text))
            .await
            .map_err(|e| e.to_string())?;
        let media = self
            .count_where(Some(MessageCategory::Media))
            .await
            .map_err(|e| e.to_string())?;
        Ok(AuditStats { total, text, media })
    }
}
