//! Chat turn orchestration.
//!
//! One turn: validate the message, append it to the user's log, ask the
//! configured provider for a reply, append the reply, return the log.
//!
//! ```text
//! Received → Validated → HistoryLoaded → ProviderInvoked → Success
//!     ↓                                        ↓
//! ValidationError                        ProviderError
//! ```
//!
//! A provider failure leaves the user message in the log; nothing is rolled back.

use crate::conversation::{ClearOutcome, ConversationLog, ConversationStore, Message};
use crate::provider::{ProviderClient, ProviderError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub const NO_MESSAGE: &str = "No message provided";
pub const USER_NOT_FOUND: &str = "User not found";

/// Errors surfaced by chat operations. Each renders as `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Provider(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Chat request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result of a successful turn.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Reply text as stored in the log
    pub message: String,
    /// Full log after the turn
    pub history: ConversationLog,
}

/// Orchestrates chat turns against one provider and one store.
pub struct ChatService {
    store: ConversationStore,
    provider: Arc<dyn ProviderClient>,
    default_user_id: String,
}

impl ChatService {
    pub fn new(
        store: ConversationStore,
        provider: Arc<dyn ProviderClient>,
        default_user_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            default_user_id: default_user_id.into(),
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn default_user_id(&self) -> &str {
        &self.default_user_id
    }

    /// Run one chat turn.
    ///
    /// `user_id` falls back to the default user; an absent or empty `message`
    /// is rejected before the store is touched.
    pub async fn chat(
        &self,
        user_id: Option<&str>,
        message: Option<&str>,
    ) -> Result<ChatReply, ChatError> {
        let message = message
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ChatError::Validation(NO_MESSAGE.to_string()))?;
        let user_id = user_id.unwrap_or(self.default_user_id.as_str());

        let start = Instant::now();
        let _turn = self.store.turn_lock(user_id).await;

        let conversation = self
            .store
            .append_and_get(user_id, Message::user(message))
            .await;

        let system_prompt = self.provider.system_prompt();
        let reply = match self
            .provider
            .send(&system_prompt, &conversation)
            .await
            .and_then(|reply| {
                if reply.is_empty() {
                    Err(ProviderError::empty_reply(self.provider.name()))
                } else {
                    Ok(reply)
                }
            }) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    status = ?e.status_code,
                    "Provider call failed; user message kept in history"
                );
                return Err(e.into());
            }
        };

        let history = self
            .store
            .append_and_get(user_id, Message::assistant(reply.clone()))
            .await;

        tracing::info!(
            provider = self.provider.name(),
            history_len = history.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Chat turn completed"
        );

        Ok(ChatReply {
            message: reply,
            history,
        })
    }

    /// Full log of a user; empty for unknown users.
    pub async fn history(&self, user_id: &str) -> ConversationLog {
        self.store.get(user_id).await
    }

    /// Empty a user's log. Unknown users are a not-found error.
    pub async fn clear(&self, user_id: &str) -> Result<(), ChatError> {
        match self.store.clear(user_id).await {
            ClearOutcome::Cleared => {
                tracing::info!(user_id = %user_id, "Chat history cleared");
                Ok(())
            }
            ClearOutcome::NotFound => Err(ChatError::NotFound(USER_NOT_FOUND.to_string())),
        }
    }
}
