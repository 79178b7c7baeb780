//! HTTP surface
//!
//! Routes, handlers and the mapping from relay outcomes to HTTP responses.

use crate::models::{ErrorBody, GenerationRequest, GenerationResult, HealthResponse};
use crate::relay::Relay;
use crate::{Error, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

pub const IMAGE_GENERATION_FAILED: &str = "Image generation failed";
pub const CHAT_FAILED: &str = "Chat failed";

#[derive(Clone)]
pub struct AppState {
    relay: Relay,
    health_message: Arc<str>,
}

impl AppState {
    pub fn new(relay: Relay, health_message: &str) -> Self {
        Self {
            relay,
            health_message: Arc::from(health_message),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/generate-image", post(generate_image_handler))
        .route("/api/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve `app` on `listener` until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    info!("Relay listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "message": "BUDDY prompt relay",
        "status": "running",
        "endpoints": {
            "generate": "/api/generate-image (POST)",
            "chat": "/api/chat (POST)",
            "health": "/health (GET)"
        }
    }))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: state.health_message.to_string(),
    })
}

// Bodies are parsed leniently so a missing, mistyped or unparseable prompt
// always yields the same 400 instead of an extractor rejection.
async fn generate_image_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let span = info_span!("generate_image", request_id = %Uuid::new_v4());

    async move {
        let request = GenerationRequest::from_json_bytes(&body);
        match state.relay.handle(request.prompt.as_deref()).await {
            Ok(GenerationResult::Image {
                bytes,
                content_type,
            }) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
            Ok(GenerationResult::Error(failure)) => {
                ApiError::Reported(failure.message).into_response()
            }
            Err(e) => ApiError::from_error(e, IMAGE_GENERATION_FAILED).into_response(),
        }
    }
    .instrument(span)
    .await
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let span = info_span!("chat", request_id = %Uuid::new_v4());

    async move {
        let request = GenerationRequest::from_json_bytes(&body);
        match state.relay.chat(request.prompt.as_deref()).await {
            Ok(reply) => Json(reply).into_response(),
            Err(e) => ApiError::from_error(e, CHAT_FAILED).into_response(),
        }
    }
    .instrument(span)
    .await
}

/// Caller-facing error. Only validation messages and upstream-reported
/// details reach the body; everything else collapses to a fixed message.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Validation(String),
    Reported(String),
    Internal(&'static str),
}

impl ApiError {
    pub fn from_error(err: Error, generic: &'static str) -> Self {
        match err {
            Error::Validation(message) => ApiError::Validation(message),
            Error::UpstreamReported { detail, .. } => ApiError::Reported(detail),
            _ => ApiError::Internal(generic),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Reported(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::Validation(message) | ApiError::Reported(message) => message,
            ApiError::Internal(message) => message.to_string(),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}
