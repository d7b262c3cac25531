//! Webhook HTTP server: inbound transport POSTs, liveness, and stats.

use crate::audit::{AuditStore, SqliteAuditStore};
use crate::config::{self, Config};
use crate::knowledge;
use crate::llm::OpenAiClient;
use crate::media::{MediaArchiver, S3BlobStore, TransportMediaClient};
use crate::relay::{render_reply, replies, Dispatcher, InboundMessage};
use anyhow::{Context, Result};
use axum::{
    extract::rejection::FormRejection,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Shared state for the webhook server.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub audit: Arc<dyn AuditStore>,
}

/// Build the router. Split out from `run_server` so tests can serve it with
/// substituted collaborators.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/stats", get(stats))
        .route("/webhook", post(webhook))
        .with_state(state)
}

/// Run the webhook server; binds to config.server.bind:config.server.port.
/// Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_server(config: Config) -> Result<()> {
    let audit: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::open(&config::resolve_database_path(&config))
            .await
            .context("opening audit database")?,
    );

    let account_sid = config::resolve_account_sid(&config).unwrap_or_default();
    let auth_token = config::resolve_auth_token(&config).unwrap_or_default();
    if account_sid.is_empty() || auth_token.is_empty() {
        log::warn!("transport credentials not configured; media downloads will fail");
    }
    let fetcher = Arc::new(TransportMediaClient::new(
        account_sid,
        auth_token,
        Duration::from_secs(config.transport.media_timeout_secs),
    ));
    let store = Arc::new(S3BlobStore::new(
        config::resolve_access_key_id(&config).unwrap_or_default(),
        config::resolve_secret_access_key(&config).unwrap_or_default(),
        config::resolve_region(&config).unwrap_or_default(),
        config::resolve_bucket(&config).unwrap_or_default(),
        config.storage.endpoint.clone(),
    ));
    let archiver = MediaArchiver::new(fetcher, store);

    let completer = Arc::new(OpenAiClient::new(
        Some(config.inference.base_url.clone()),
        config::resolve_inference_api_key(&config).unwrap_or_default(),
        config.inference.model.clone(),
        config.inference.max_tokens,
        config.inference.temperature,
    ));

    let knowledge = knowledge::load_knowledge(&config);
    let dispatcher = Arc::new(Dispatcher::new(
        completer,
        archiver,
        audit.clone(),
        knowledge,
    ));
    let state = AppState { dispatcher, audit };

    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("webhook server listening on {}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server exited")?;
    log::info!("webhook server stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /webhook — parse the form, dispatch, reply with the XML envelope.
/// Always returns 200: failures are absorbed into fixed reply texts so the
/// transport does not treat the message as undelivered.
async fn webhook(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(f)) => f,
        Err(e) => {
            log::warn!("unparseable webhook form: {}", e);
            HashMap::new()
        }
    };
    let msg = InboundMessage::from_form(&form);
    log::info!("received message from {}: {}", msg.sender_id, msg.body);

    // Dispatch in its own task so a panic anywhere in the pipeline still
    // produces the generic fallback with a success status.
    let dispatcher = state.dispatcher.clone();
    let reply = match tokio::spawn(async move { dispatcher.handle(&msg).await }).await {
        Ok(reply) => reply.text,
        Err(e) => {
            log::error!("webhook handling failed: {}", e);
            replies::WEBHOOK_FAILED.to_string()
        }
    };
    xml_response(&reply)
}

fn xml_response(text: &str) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        render_reply(text),
    )
        .into_response()
}

/// GET / — static liveness payload for probes.
async fn liveness() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Dharavi WhatsApp relay is running",
        "status": "active",
    }))
}

/// GET /stats — audit log counts; an error payload (still 200) when the store
/// fails, matching the webhook's absorb-everything policy.
async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.audit.stats().await {
        Ok(s) => Json(json!({
            "totalMessages": s.total,
            "textMessages": s.text,
            "mediaMessages": s.media,
            "status": "active",
        })),
        Err(e) => {
            log::error!("stats query failed: {}", e);
            Json(json!({ "error": "Could not retrieve stats" }))
        }
    }
}
