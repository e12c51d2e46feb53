//! HTTP gateway for Stepwise.
//!
//! Streams turn-engine events to browsers and other clients:
//!
//! - `POST /api/chat` — `{"message": "..."}` in, `text/event-stream` out.
//!   Every engine event is one `data: <json>` frame; the stream closes
//!   with `data: [DONE]`.
//! - `GET /api/tools` — the registered tool definitions
//! - `GET /health` — liveness
//!
//! Built on Axum. Each request gets its own engine run; runs share only
//! the provider and the tool registry.

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::{
    Router,
    extract::State,
    response::Json,
    response::sse::{Event as SseEvent, Sse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use stepwise_agent::TurnEngine;
use stepwise_config::AppConfig;
use stepwise_core::tool::ToolDefinition;

/// Request bodies above this size are rejected.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: TurnEngine,
    /// Origins allowed by CORS; empty allows any origin
    pub allowed_origins: Vec<String>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/tools", get(tools_handler))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let engine = stepwise_agent::build_engine(&config)?;
    let state = Arc::new(GatewayState {
        engine,
        allowed_origins: config.gateway.allowed_origins.clone(),
    });
    let app = build_router(state);

    info!(addr = %addr, model = %config.provider.model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn tools_handler(State(state): State<SharedState>) -> Json<Vec<ToolDefinition>> {
    Json(state.engine.tools().definitions())
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<
    Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>,
    (StatusCode, Json<ErrorResponse>),
> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "message must not be empty".into(),
            }),
        ));
    }

    info!(chars = message.len(), "Chat request");
    let rx = state.engine.run_stream(message);

    let stream = ReceiverStream::new(rx)
        .map(|event| {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Ok(SseEvent::default().data(data))
        })
        .chain(tokio_stream::once(Ok(SseEvent::default().data("[DONE]"))));

    Ok(Sse::new(stream))
}
