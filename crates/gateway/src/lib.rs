//! HTTP gateway for DialogBridge.
//!
//! Exposes the fulfillment webhook the conversational platform posts to,
//! plus a health check. Built on Axum.
//!
//! The webhook always answers `200 OK`: the platform renders its own generic
//! error for anything else, so every failure is turned into the configured
//! fallback reply here instead.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::{
    Router,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use futures::FutureExt;
use serde::Serialize;
use tracing::{Instrument, info, info_span};

use dialogbridge_assistant::Orchestrator;
use dialogbridge_core::error::WebhookError;
use dialogbridge_core::fulfillment::{WebhookRequest, WebhookResponse};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl GatewayState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            started_at: chrono::Utc::now(),
        }
    }
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(
    state: SharedState,
    gateway: &dialogbridge_config::GatewayConfig,
) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(&gateway.webhook_path, post(webhook_handler))
        .layer(DefaultBodyLimit::max(gateway.max_body_bytes))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: dialogbridge_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let router = dialogbridge_providers::router::build_from_config(&config);
    let provider = router.default().ok_or_else(|| {
        format!("No provider registered under '{}'", router.default_name())
    })?;

    let orchestrator = Arc::new(Orchestrator::from_config(provider, &config));
    info!(
        provider = %orchestrator.provider_name(),
        model = %orchestrator.model(),
        "Completion provider ready"
    );

    let state = Arc::new(GatewayState::new(orchestrator));
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, path = %config.gateway.webhook_path, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}

async fn webhook_handler(
    State(state): State<SharedState>,
    body: Result<Bytes, BytesRejection>,
) -> (StatusCode, Json<WebhookResponse>) {
    let orchestrator = &state.orchestrator;
    let response = match body {
        Ok(bytes) => fulfill_guarded(orchestrator, &bytes).await,
        Err(rejection) => {
            orchestrator.recover(&WebhookError::MalformedInput(rejection.body_text()))
        }
    };
    (StatusCode::OK, Json(response))
}

/// Parse and fulfill one request; a panic anywhere below becomes the fallback.
async fn fulfill_guarded(orchestrator: &Orchestrator, body: &[u8]) -> WebhookResponse {
    let request = match WebhookRequest::parse(body) {
        Ok(request) => request,
        Err(e) => return orchestrator.recover(&e),
    };

    let request_id = request
        .response_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let span = info_span!("webhook", request_id = %request_id);

    async {
        info!(
            contexts = request.contexts().len(),
            query_len = request.query_result.query_text.len(),
            "Webhook received"
        );
        match AssertUnwindSafe(orchestrator.handle(&request))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(payload) => {
                orchestrator.recover(&WebhookError::Unexpected(panic_message(payload.as_ref())))
            }
        }
    }
    .instrument(span)
    .await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".into()
    }
}
