//! Relay Gateway - HTTP chat relay for the AI Innovate Solutions assistant.
//!
//! This crate provides:
//! - Per-user in-memory conversation history
//! - Prompt assembly around a static business context
//! - One configured LLM provider (Gemini or DeepSeek) per process
//! - The HTTP surface for chat, history, clear, and health
//!
//! ## Architecture
//!
//! ```text
//! Client → /api/chat → ChatService (store ← user msg) → Provider → (store ← reply) → Client
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod chat;
pub mod conversation;
pub mod format;
pub mod prompt;
pub mod provider;
pub mod routes;

pub use chat::{ChatError, ChatReply, ChatService};
pub use conversation::{ClearOutcome, ConversationLog, ConversationStore, Message, Role};
pub use format::format_response;
pub use provider::{DeepSeekProvider, GeminiProvider, ProviderClient, ProviderError};
pub use routes::AppState;

use axum::Router;
use relay_common::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build application state from configuration.
pub fn build_state(config: &Config) -> AppState {
    let provider = provider::from_config(&config.provider);
    let service = ChatService::new(
        ConversationStore::new(),
        provider,
        config.chat.default_user_id.clone(),
    );
    AppState::new(service)
}

/// Build the relay router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::build_routes(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
}

/// Start the relay server and run until Ctrl-C.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let state = build_state(config);

    tracing::info!(
        provider = state.chat.provider_name(),
        "Starting chat relay on {}",
        addr
    );

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Chat relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
