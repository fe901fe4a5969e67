//! Route definitions for the chat relay.
//!
//! Provides HTTP endpoints for chatting, reading and clearing history, and
//! health checks. Every error renders as `{"error": <message>}`.

use crate::chat::{ChatError, ChatService};
use crate::conversation::ConversationLog;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use relay_common::logging::{trace_id_from_headers, TRACE_ID_HEADER};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }
}

/// Chat request body.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Chat response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub history: ConversationLog,
}

/// History response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: ConversationLog,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Build the relay routes.
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/history/:user_id", get(history_handler))
        .route("/api/clear/:user_id", post(clear_handler))
        .with_state(state)
        .merge(health_routes())
}

/// Build health check routes.
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/api/health", get(health_handler))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let trace_id = trace_id_from_headers(&headers);

    let result = match body {
        Ok(Json(request)) => run_turn(state, request, &trace_id).await,
        Err(rejection) => {
            tracing::debug!(trace_id = %trace_id, error = %rejection.body_text(), "Rejected chat body");
            Err(ChatError::Validation(rejection.body_text()))
        }
    };

    let mut response = match result {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => e.into_response(),
    };
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
    }
    response
}

/// Run the turn on its own task.
///
/// A client that disconnects mid-turn cannot cancel it halfway, and a panic
/// inside the turn comes back as an internal error instead of a dropped
/// connection.
async fn run_turn(
    state: AppState,
    request: ChatRequest,
    trace_id: &str,
) -> Result<ChatResponse, ChatError> {
    let ChatRequest { user_id, message } = request;
    let user_id = user_id.unwrap_or_else(|| state.chat.default_user_id().to_string());
    let span = relay_common::turn_span!(trace_id, user_id);

    let chat = state.chat.clone();
    let task = tokio::spawn(
        async move {
            chat.chat(Some(user_id.as_str()), message.as_deref())
                .await
                .map(|reply| ChatResponse {
                    message: reply.message,
                    history: reply.history,
                })
        }
        .instrument(span),
    );

    task.await
        .map_err(|e| ChatError::Internal(e.to_string()))?
}

async fn history_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        history: state.chat.history(&user_id).await,
    })
}

async fn clear_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ChatError> {
    state.chat.clear(&user_id).await?;
    Ok(Json(MessageResponse {
        message: "Chat history cleared".into(),
    }))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "API is running".into(),
    })
}
