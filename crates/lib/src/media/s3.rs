//! S3-compatible blob store: PUT objects with AWS Signature V4 over reqwest.
//!
//! Keys produced by the archiver are URL-safe by construction (date segments,
//! a UUID, and a derived filename), so the canonical URI is the key as-is.

use crate::media::BlobStore;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// S3-compatible store. With no endpoint override, objects go to
/// `https://{bucket}.s3.{region}.amazonaws.com/{key}`; with an endpoint
/// (e.g. a local minio) path-style addressing `{endpoint}/{bucket}/{key}` is used.
pub struct S3BlobStore {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    bucket: String,
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl S3BlobStore {
    pub fn new(
        access_key_id: String,
        secret_access_key: String,
        region: String,
        bucket: String,
        endpoint: Option<String>,
    ) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            region,
            bucket,
            endpoint: endpoint
                .map(|e| e.trim_end_matches('/').to_string())
                .filter(|e| !e.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    /// Public URL of an object under `key`.
    pub fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(ep) => format!("{}/{}/{}", ep, self.bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }

    /// Host header value and canonical URI for signing.
    fn host_and_path(&self, key: &str) -> (String, String) {
        match &self.endpoint {
            Some(ep) => {
                let host = ep
                    .strip_prefix("https://")
                    .or_else(|| ep.strip_prefix("http://"))
                    .unwrap_or(ep)
                    .to_string();
                (host, format!("/{}/{}", self.bucket, key))
            }
            None => (
                format!("{}.s3.{}.amazonaws.com", self.bucket, self.region),
                format!("/{}", key),
            ),
        }
    }

    fn authorization(
        &self,
        canonical_uri: &str,
        host: &str,
        content_type: &str,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> (String, String) {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let canonical_request = canonical_put_request(
            canonical_uri,
            host,
            content_type,
            payload_hash,
            &amz_date,
        );
        let scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );
        let key = signing_key(&self.secret_access_key, &date_stamp, &self.region, "s3");
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));
        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key_id, scope, SIGNED_HEADERS, signature
        );
        (authorization, amz_date)
    }
}

const SIGNED_HEADERS: &str = "content-type;host;x-amz-content-sha256;x-amz-date";

/// Canonical request for a query-less PUT with the fixed signed-header set.
fn canonical_put_request(
    canonical_uri: &str,
    host: &str,
    content_type: &str,
    payload_hash: &str,
    amz_date: &str,
) -> String {
    format!(
        "PUT\n{}\n\ncontent-type:{}\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
        canonical_uri, content_type, host, payload_hash, amz_date, SIGNED_HEADERS, payload_hash
    )
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(msg);
    mac.finalize().into_bytes().to_vec()
}

/// AWS V4 signing key: chained HMACs over date, region, service.
fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, String> {
        let payload_hash = hex::encode(Sha256::digest(&bytes));
        let (host, canonical_uri) = self.host_and_path(key);
        let now = Utc::now();
        let (authorization, amz_date) =
            self.authorization(&canonical_uri, &host, content_type, &payload_hash, now);
        let scheme = match &self.endpoint {
            Some(ep) if ep.starts_with("http://") => "http",
            _ => "https",
        };
        let url = format!("{}://{}{}", scheme, host, canonical_uri);
        let res = self
            .client
            .put(&url)
            .header("Authorization", authorization)
            .header("x-amz-date", amz_date)
            .header("x-amz-content-sha256", payload_hash)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("blob upload failed: {} {}", status, body));
        }
        Ok(self.object_url(key))
    }
}
