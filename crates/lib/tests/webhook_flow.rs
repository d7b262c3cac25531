//! Integration tests: serve the webhook router on a free port with substituted
//! collaborators, POST transport-style forms, and assert the XML replies and
//! audit records. No transport, inference, or storage backends are required.

use async_trait::async_trait;
use bytes::Bytes;
use lib::audit::{AuditRecord, AuditStats, AuditStore, MessageCategory};
use lib::llm::ChatCompleter;
use lib::media::{BlobStore, FetchError, MediaArchiver, MediaFetcher};
use lib::relay::{render_reply, replies, Dispatcher};
use lib::server::{router, AppState};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct RecordingAudit {
    records: Mutex<Vec<AuditRecord>>,
    fail_stats: bool,
}

impl RecordingAudit {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            fail_stats: false,
        })
    }

    fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditStore for RecordingAudit {
    async fn insert(&self, record: AuditRecord) -> Result<(), String> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn stats(&self) -> Result<AuditStats, String> {
        if self.fail_stats {
            return Err("database unavailable".to_string());
        }
        let records = self.records.lock().unwrap();
        let media = records
            .iter()
            .filter(|r| r.category == MessageCategory::Media)
            .count() as i64;
        let total = records.len() as i64;
        Ok(AuditStats {
            total,
            text: total - media,
            media,
        })
    }
}

struct StaticCompleter {
    reply: Result<String, String>,
}

#[async_trait]
impl ChatCompleter for StaticCompleter {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, String> {
        self.reply.clone()
    }
}

enum FetchBehavior {
    Ok(Vec<u8>),
    Status(u16),
}

struct StubFetcher {
    behavior: FetchBehavior,
}

#[async_trait]
impl MediaFetcher for StubFetcher {
    async fn fetch(&self, _url: &str) -> Result<Bytes, FetchError> {
        match &self.behavior {
            FetchBehavior::Ok(bytes) => Ok(Bytes::from(bytes.clone())),
            FetchBehavior::Status(code) => Err(FetchError::Status(*code)),
        }
    }
}

struct StubStore {
    result: Result<String, String>,
}

#[async_trait]
impl BlobStore for StubStore {
    async fn put(&self, _key: &str, _bytes: Bytes, _content_type: &str) -> Result<String, String> {
        self.result.clone()
    }
}

fn state(
    completer_reply: Result<String, String>,
    fetch: FetchBehavior,
    store: Result<String, String>,
    audit: Arc<RecordingAudit>,
) -> AppState {
    let archiver = MediaArchiver::new(
        Arc::new(StubFetcher { behavior: fetch }),
        Arc::new(StubStore { result: store }),
    );
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(StaticCompleter {
            reply: completer_reply,
        }),
        archiver,
        audit.clone(),
        "knowledge document".to_string(),
    ));
    AppState {
        dispatcher,
        audit,
    }
}

/// Serve the router on a free port; returns the base URL once it answers.
async fn serve(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(state)).await;
    });
    let base = format!("http://{}", addr);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(&base).send().await {
            if resp.status().is_success() {
                return base;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {} did not come up within 2s", base);
}

async fn post_form(base: &str, fields: &[(&str, &str)]) -> (reqwest::StatusCode, String) {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/webhook", base))
        .form(fields)
        .send()
        .await
        .expect("POST /webhook");
    let status = resp.status();
    let body = resp.text().await.expect("response body");
    (status, body)
}

#[tokio::test]
async fn liveness_returns_static_payload() {
    let base = serve(state(
        Ok("unused".into()),
        FetchBehavior::Status(404),
        Err("unused".into()),
        RecordingAudit::new(),
    ))
    .await;
    let json: serde_json::Value = reqwest::get(&base)
        .await
        .expect("GET /")
        .json()
        .await
        .expect("parse JSON");
    assert_eq!(json["status"], "active");
    assert_eq!(json["message"], "Dharavi WhatsApp relay is running");
}

#[tokio::test]
async fn greeting_reply_matches_fixed_text() {
    let audit = RecordingAudit::new();
    let base = serve(state(
        Ok("generated".into()),
        FetchBehavior::Status(404),
        Err("unused".into()),
        audit.clone(),
    ))
    .await;
    let (status, body) = post_form(
        &base,
        &[("From", "whatsapp:+911234567890"), ("Body", "hi, I have a Query")],
    )
    .await;
    assert!(status.is_success());
    assert_eq!(body, render_reply(replies::GREETING));
    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sender_id, "whatsapp:+911234567890");
    assert_eq!(records[0].category, MessageCategory::Text);
}

#[tokio::test]
async fn empty_message_prompts_for_input() {
    let audit = RecordingAudit::new();
    let base = serve(state(
        Ok("unused".into()),
        FetchBehavior::Status(404),
        Err("unused".into()),
        audit.clone(),
    ))
    .await;
    let (_, body) = post_form(&base, &[("From", "whatsapp:+911234567890")]).await;
    assert_eq!(body, render_reply(replies::EMPTY_PROMPT));
    assert_eq!(audit.records().len(), 1);
    assert_eq!(audit.records()[0].message_text, "Empty message");
}

#[tokio::test]
async fn inference_failure_yields_apology() {
    let audit = RecordingAudit::new();
    let base = serve(state(
        Err("quota exceeded".into()),
        FetchBehavior::Status(404),
        Err("unused".into()),
        audit.clone(),
    ))
    .await;
    let (_, body) = post_form(
        &base,
        &[("From", "whatsapp:+911234567890"), ("Body", "what are the benefits?")],
    )
    .await;
    assert_eq!(body, render_reply(replies::INFERENCE_UNAVAILABLE));
    assert_ne!(body, render_reply(replies::GREETING));
    assert_ne!(body, render_reply(replies::EMPTY_PROMPT));
    assert_eq!(audit.records().len(), 1);
}

#[tokio::test]
async fn media_download_failure_reply_and_record() {
    let audit = RecordingAudit::new();
    let base = serve(state(
        Ok("unused".into()),
        FetchBehavior::Status(404),
        Err("unused".into()),
        audit.clone(),
    ))
    .await;
    let (_, body) = post_form(
        &base,
        &[
            ("From", "whatsapp:+911234567890"),
            ("MediaUrl0", "https://api.twilio.com/media/ME123"),
            ("MediaContentType0", "application/pdf"),
        ],
    )
    .await;
    assert_eq!(body, render_reply(replies::MEDIA_DOWNLOAD_FAILED));
    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, MessageCategory::Media);
    assert!(records[0].media_reference.is_none());
}

#[tokio::test]
async fn media_success_records_public_url() {
    let audit = RecordingAudit::new();
    let url = "https://drp-uploads.s3.ap-south-1.amazonaws.com/2024/01/02/k.jpg";
    let base = serve(state(
        Ok("unused".into()),
        FetchBehavior::Ok(vec![1, 2, 3]),
        Ok(url.to_string()),
        audit.clone(),
    ))
    .await;
    let (_, body) = post_form(
        &base,
        &[
            ("From", "whatsapp:+911234567890"),
            ("MediaUrl0", "https://api.twilio.com/media/ME123"),
            ("MediaContentType0", "image/jpeg"),
        ],
    )
    .await;
    assert_eq!(body, render_reply(replies::MEDIA_STORED));
    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].media_reference.as_deref(), Some(url));
}

#[tokio::test]
async fn stats_counts_add_up() {
    let audit = RecordingAudit::new();
    let base = serve(state(
        Ok("an answer".into()),
        FetchBehavior::Ok(vec![1]),
        Ok("https://u".to_string()),
        audit.clone(),
    ))
    .await;
    post_form(&base, &[("From", "a"), ("Body", "first question")]).await;
    post_form(&base, &[("From", "b"), ("Body", "second question")]).await;
    post_form(
        &base,
        &[("From", "c"), ("MediaUrl0", "https://api.twilio.com/media/ME1")],
    )
    .await;

    let json: serde_json::Value = reqwest::get(format!("{}/stats", base))
        .await
        .expect("GET /stats")
        .json()
        .await
        .expect("parse JSON");
    assert_eq!(json["totalMessages"], 3);
    assert_eq!(json["textMessages"], 2);
    assert_eq!(json["mediaMessages"], 1);
    assert_eq!(
        json["totalMessages"].as_i64(),
        Some(json["textMessages"].as_i64().unwrap() + json["mediaMessages"].as_i64().unwrap())
    );
}

#[tokio::test]
async fn stats_failure_returns_error_payload() {
    let audit = Arc::new(RecordingAudit {
        records: Mutex::new(Vec::new()),
        fail_stats: true,
    });
    let base = serve(state(
        Ok("unused".into()),
        FetchBehavior::Status(404),
        Err("unused".into()),
        audit,
    ))
    .await;
    let resp = reqwest::get(format!("{}/stats", base)).await.expect("GET /stats");
    assert!(resp.status().is_success());
    let json: serde_json::Value = resp.json().await.expect("parse JSON");
    assert_eq!(json["error"], "Could not retrieve stats");
}

#[tokio::test]
async fn reply_content_type_is_xml() {
    let base = serve(state(
        Ok("unused".into()),
        FetchBehavior::Status(404),
        Err("unused".into()),
        RecordingAudit::new(),
    ))
    .await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/webhook", base))
        .form(&[("From", "whatsapp:+911234567890")])
        .send()
        .await
        .expect("POST /webhook");
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert_eq!(content_type, "application/xml");
}
