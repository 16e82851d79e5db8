//! HTTP API gateway for Respondo.
//!
//! Endpoints:
//!
//! - `GET  /health`      — liveness probe
//! - `POST /v1/respond`  — answer one inbound customer message
//!
//! Built on Axum. The gateway owns nothing: it validates the payload,
//! hands it to the [`Responder`] and maps the outcome to JSON.

pub mod delivery;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use respondo_agent::{RespondOutcome, RespondRequest, Responder};
use respondo_core::{Error, InvocationStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use delivery::{LogDelivery, WebhookDelivery};

/// Request body size limit (64 KB). Messages are short text.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub struct GatewayState {
    pub responder: Responder,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/respond", post(respond_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

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

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondPayload {
    pub agent_id: String,
    pub contact_id: String,
    pub thread_id: String,
    pub message: String,
    #[serde(default)]
    pub is_test_mode: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyResponse {
    success: bool,
    response: String,
    response_time: u64,
    tokens_used: u32,
    tools_executed: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    is_test_mode: bool,
}

#[derive(Debug, Serialize)]
struct SkippedResponse {
    success: bool,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

async fn respond_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RespondPayload>,
) -> Response {
    if let Some(field) = first_missing_field(&payload) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                error: format!("missing required field: {field}"),
            }),
        )
            .into_response();
    }

    info!(
        agent_id = %payload.agent_id,
        thread_id = %payload.thread_id,
        is_test_mode = payload.is_test_mode,
        "v1/respond request"
    );

    let request = RespondRequest {
        agent_id: payload.agent_id,
        contact_id: payload.contact_id,
        thread_id: payload.thread_id,
        message: payload.message,
        is_test_mode: payload.is_test_mode,
    };

    match state.responder.respond(&request).await {
        Ok(RespondOutcome::Replied {
            response,
            response_time_ms,
            tokens_used,
            tools_executed,
        }) => Json(ReplyResponse {
            success: true,
            response,
            response_time: response_time_ms,
            tokens_used,
            tools_executed,
            is_test_mode: request.is_test_mode,
        })
        .into_response(),
        Ok(RespondOutcome::Skipped(status)) => Json(SkippedResponse {
            success: true,
            status: skip_status_label(status),
        })
        .into_response(),
        Err(e) => (
            error_status(&e),
            Json(ErrorResponse {
                success: false,
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

fn first_missing_field(payload: &RespondPayload) -> Option<&'static str> {
    if payload.agent_id.trim().is_empty() {
        Some("agentId")
    } else if payload.contact_id.trim().is_empty() {
        Some("contactId")
    } else if payload.thread_id.trim().is_empty() {
        Some("threadId")
    } else if payload.message.trim().is_empty() {
        Some("message")
    } else {
        None
    }
}

fn skip_status_label(status: InvocationStatus) -> &'static str {
    match status {
        InvocationStatus::SkippedMaxMessages => "max_messages_reached",
        _ => "out_of_hours",
    }
}

/// Misconfiguration is the caller's problem; upstream failures are not.
fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::Config { .. } => StatusCode::BAD_REQUEST,
        Error::Provider(_) | Error::Delivery(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
