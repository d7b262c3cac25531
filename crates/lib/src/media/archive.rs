//! Attachment archiving: fetch from the transport, store in the blob store.

use crate::media::{BlobStore, FetchError, MediaFetcher};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Why archiving failed; each variant maps to a distinct user-facing reply.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The media URL returned a non-success status.
    #[error("media download failed with status {0}")]
    Download(u16),
    /// Transport-level failure while fetching (connect, timeout, body read).
    #[error("media fetch failed: {0}")]
    Fetch(String),
    /// The blob store rejected the upload.
    #[error("media store failed: {0}")]
    Store(String),
}

/// Fetches an attachment with the transport's auth and stores it under a
/// dated, collision-free key.
pub struct MediaArchiver {
    fetcher: Arc<dyn MediaFetcher>,
    store: Arc<dyn BlobStore>,
}

impl MediaArchiver {
    pub fn new(fetcher: Arc<dyn MediaFetcher>, store: Arc<dyn BlobStore>) -> Self {
        Self { fetcher, store }
    }

    /// Fetch the attachment bytes and store them; returns the public URL of
    /// the stored object.
    pub async fn archive(&self, media_url: &str, content_type: &str) -> Result<String, ArchiveError> {
        let bytes = self.fetcher.fetch(media_url).await.map_err(|e| match e {
            FetchError::Status(code) => ArchiveError::Download(code),
            FetchError::Transport(msg) => ArchiveError::Fetch(msg),
        })?;
        let key = object_key(content_type, Utc::now());
        let url = self
            .store
            .put(&key, bytes, content_type)
            .await
            .map_err(ArchiveError::Store)?;
        log::info!("archived attachment as {}", key);
        Ok(url)
    }
}

/// Filename derived from the content type, stamped so repeat sends never collide.
fn attachment_filename(content_type: &str, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    if content_type.contains("image") {
        format!("image_{}.jpg", stamp)
    } else if content_type.contains("pdf") {
        format!("document_{}.pdf", stamp)
    } else {
        format!("file_{}", stamp)
    }
}

/// Storage key: date prefix plus a unique id, e.g. `2024/01/02/<uuid>_image_20240102_030405.jpg`.
fn object_key(content_type: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}_{}",
        now.format("%Y/%m/%d"),
        uuid::Uuid::new_v4(),
        attachment_filename(content_type, now)
    )
}
