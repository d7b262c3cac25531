//! Media handling: authenticated fetch from the transport, blob storage, archiving.
//!
//! The archiver composes two narrow capabilities so either side can be
//! substituted in tests: fetching attachment bytes and storing them.

mod archive;
mod fetch;
mod s3;

pub use archive::{ArchiveError, MediaArchiver};
pub use fetch::TransportMediaClient;
pub use s3::S3BlobStore;

use async_trait::async_trait;
use bytes::Bytes;

/// Why fetching attachment bytes failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("media fetch failed: {0}")]
    Transport(String),
    /// Non-success HTTP status from the media URL.
    #[error("media download failed with status {0}")]
    Status(u16),
}

/// Fetch attachment bytes from the messaging transport.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Store a blob under a key; returns the public URL of the stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, String>;
}
