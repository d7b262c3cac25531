//! Attachment download from the transport's media URLs (HTTP Basic auth).

use crate::media::{FetchError, MediaFetcher};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Downloads attachment bytes from the transport, authenticating with the
/// account credential pair. Requests are bounded by the configured timeout.
pub struct TransportMediaClient {
    account_sid: String,
    auth_token: String,
    client: reqwest::Client,
}

impl TransportMediaClient {
    pub fn new(account_sid: String, auth_token: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            account_sid,
            auth_token,
            client,
        }
    }
}

#[async_trait]
impl MediaFetcher for TransportMediaClient {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let res = self
            .client
            .get(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = res.status();
        log::info!("media download status: {}", status);
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        res.bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}
