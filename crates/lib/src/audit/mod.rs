//! Audit log: one persisted record per handled inbound message.
//!
//! Records are append-only and never read back on the request path; the stats
//! endpoint aggregates counts. Insert failures must never block a reply, so
//! the store is behind a narrow trait and callers log-and-continue.

mod sqlite;

pub use sqlite::SqliteAuditStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Category of a handled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCategory {
    Text,
    Media,
}

impl MessageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageCategory::Text => "text",
            MessageCategory::Media => "media",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageCategory::Text),
            "media" => Some(MessageCategory::Media),
            _ => None,
        }
    }
}

/// The persisted log entry for one handled inbound message.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub sender_id: String,
    pub message_text: String,
    pub category: MessageCategory,
    pub media_reference: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub response_text: String,
}

impl AuditRecord {
    /// Builds a record stamped with the current server time.
    pub fn new(
        sender_id: impl Into<String>,
        message_text: impl Into<String>,
        category: MessageCategory,
        media_reference: Option<String>,
        response_text: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            message_text: message_text.into(),
            category,
            media_reference,
            timestamp: Utc::now(),
            response_text: response_text.into(),
        }
    }
}

/// Aggregate counts over the audit log.
#[derive(Debug, Clone, Copy)]
pub struct AuditStats {
    pub total: i64,
    pub text: i64,
    pub media: i64,
}

/// Persistence for audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, record: AuditRecord) -> Result<(), String>;
    async fn stats(&self) -> Result<AuditStats, String>;
}
