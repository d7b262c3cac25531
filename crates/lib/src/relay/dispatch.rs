//! Dispatch: route an inbound message to media, greeting, query, or empty
//! handling and produce the reply.

use crate::audit::{AuditRecord, AuditStore, MessageCategory};
use crate::llm::ChatCompleter;
use crate::media::{ArchiveError, MediaArchiver};
use crate::relay::replies;
use crate::relay::InboundMessage;
use std::sync::Arc;

/// The reply produced for one inbound message; consumed once by the responder.
#[derive(Debug, Clone)]
pub struct OutboundReply {
    pub text: String,
}

/// Routes inbound messages. Collaborators are injected at construction so each
/// can be substituted independently in tests.
pub struct Dispatcher {
    completer: Arc<dyn ChatCompleter>,
    archiver: MediaArchiver,
    audit: Arc<dyn AuditStore>,
    knowledge: String,
}

struct RouteOutcome {
    reply: String,
    logged_text: String,
    category: MessageCategory,
    media_reference: Option<String>,
}

impl Dispatcher {
    pub fn new(
        completer: Arc<dyn ChatCompleter>,
        archiver: MediaArchiver,
        audit: Arc<dyn AuditStore>,
        knowledge: String,
    ) -> Self {
        Self {
            completer,
            archiver,
            audit,
            knowledge,
        }
    }

    /// Handle one inbound message. Every call records exactly one audit entry,
    /// whichever path was taken; audit failures are logged and never block the
    /// reply.
    pub async fn handle(&self, msg: &InboundMessage) -> OutboundReply {
        let outcome = self.route(msg).await;
        let record = AuditRecord::new(
            msg.sender_id.clone(),
            outcome.logged_text,
            outcome.category,
            outcome.media_reference,
            outcome.reply.clone(),
        );
        if let Err(e) = self.audit.insert(record).await {
            log::warn!("audit insert failed: {}", e);
        }
        OutboundReply {
            text: outcome.reply,
        }
    }

    async fn route(&self, msg: &InboundMessage) -> RouteOutcome {
        if let Some(url) = msg.attachment_url.as_deref() {
            let content_type = msg.attachment_content_type.as_deref().unwrap_or("");
            let (reply, media_reference) = match self.archiver.archive(url, content_type).await {
                Ok(stored_url) => (replies::MEDIA_STORED.to_string(), Some(stored_url)),
                Err(ArchiveError::Download(code)) => {
                    log::warn!("media download failed: status {}", code);
                    (replies::MEDIA_DOWNLOAD_FAILED.to_string(), None)
                }
                Err(ArchiveError::Store(e)) => {
                    log::warn!("media store failed: {}", e);
                    (replies::MEDIA_STORE_FAILED.to_string(), None)
                }
                Err(ArchiveError::Fetch(e)) => {
                    log::warn!("media handling failed: {}", e);
                    (replies::MEDIA_PROCESSING_FAILED.to_string(), None)
                }
            };
            RouteOutcome {
                reply,
                logged_text: "Media file".to_string(),
                category: MessageCategory::Media,
                media_reference,
            }
        } else if !msg.body.is_empty() {
            let reply = if is_greeting(&msg.body) {
                replies::GREETING.to_string()
            } else {
                self.knowledge_reply(&msg.body).await
            };
            RouteOutcome {
                reply,
                logged_text: msg.body.clone(),
                category: MessageCategory::Text,
                media_reference: None,
            }
        } else {
            RouteOutcome {
                reply: replies::EMPTY_PROMPT.to_string(),
                logged_text: "Empty message".to_string(),
                category: MessageCategory::Text,
                media_reference: None,
            }
        }
    }

    /// Ask the inference collaborator, grounding the answer in the knowledge
    /// document. Any failure becomes the fixed apology reply.
    async fn knowledge_reply(&self, user_text: &str) -> String {
        let system = format!(
            "You are a helpful assistant for the Dharavi Redevelopment Project. \
             Use the following information to answer user questions: {}. \
             If the question is not related to Dharavi redevelopment, politely \
             redirect the conversation back to the project.",
            self.knowledge
        );
        match self.completer.complete(&system, user_text).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("inference request failed: {}", e);
                replies::INFERENCE_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Crude first-contact heuristic: the body mentions both "hi" and "query"
/// (substrings, case-insensitive, not whole words).
fn is_greeting(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("hi") && lower.contains("query")
}
