//! LLM provider abstraction.
//!
//! Exactly one provider answers chat turns for the life of the process. It is
//! chosen at startup from configuration and used through [`ProviderClient`].

mod deepseek;
mod gemini;

pub use deepseek::DeepSeekProvider;
pub use gemini::GeminiProvider;

use crate::conversation::Message;
use async_trait::async_trait;
use relay_common::config::{ProviderConfig, ProviderKind};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Provider Trait
// ============================================================================

/// Unified interface for the upstream LLM APIs.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// System prompt this provider expects in front of the conversation.
    fn system_prompt(&self) -> String;

    /// Send the system prompt and the conversation, returning the reply text.
    async fn send(&self, system_prompt: &str, conversation: &[Message])
        -> Result<String, ProviderError>;
}

/// Message for a successful upstream call that produced no text.
pub const UNKNOWN_API_ERROR: &str = "Unknown API error";

/// Error from a provider call.
///
/// Displays as the bare message so it can be handed to clients unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub provider: String,
    pub message: String,
    pub status_code: Option<u16>,
}

impl ProviderError {
    pub fn new(provider: &str, message: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Non-success HTTP status from the upstream API.
    pub fn upstream(provider: &str, status: u16, body: &str) -> Self {
        Self {
            provider: provider.to_string(),
            message: format!("API Error: {status} - {body}"),
            status_code: Some(status),
        }
    }

    /// Transport failure, including the bounded request timeout.
    pub fn transport(provider: &str, error: &reqwest::Error, timeout: Duration) -> Self {
        let message = if error.is_timeout() {
            format!("Request timed out after {}s", timeout.as_secs())
        } else {
            format!("Request failed: {error}")
        };
        Self::new(provider, message)
    }

    pub fn missing_key(provider: &str) -> Self {
        Self::new(provider, format!("{provider} API key not configured"))
    }

    /// Upstream answered successfully but with no reply text.
    pub fn empty_reply(provider: &str) -> Self {
        Self::new(provider, UNKNOWN_API_ERROR)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Build a reqwest client with the relay's timeouts.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

// ============================================================================
// Startup selection
// ============================================================================

/// Build the configured provider.
pub fn from_config(config: &ProviderConfig) -> Arc<dyn ProviderClient> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.kind {
        ProviderKind::Gemini => {
            if config.gemini.api_key.is_none() {
                tracing::warn!("No Gemini API key configured; chat turns will fail");
            }
            Arc::new(GeminiProvider::new(config.gemini.clone(), timeout))
        }
        ProviderKind::DeepSeek => {
            if config.deepseek.api_key.is_none() {
                tracing::warn!("No DeepSeek API key configured; chat turns will fail");
            }
            Arc::new(DeepSeekProvider::new(config.deepseek.clone(), timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_embeds_status_and_body() {
        let err = ProviderError::upstream("gemini", 503, "overloaded");
        assert_eq!(err.to_string(), "API Error: 503 - overloaded");
        assert_eq!(err.status_code, Some(503));
        assert_eq!(err.provider, "gemini");
    }

    #[test]
    fn missing_key_message() {
        let err = ProviderError::missing_key("deepseek");
        assert_eq!(err.to_string(), "deepseek API key not configured");
        assert!(err.status_code.is_none());
    }

    #[test]
    fn empty_reply_message() {
        let err = ProviderError::empty_reply("gemini");
        assert_eq!(err.to_string(), UNKNOWN_API_ERROR);
        assert!(err.status_code.is_none());
    }

    #[test]
    fn factory_selects_configured_variant() {
        let mut config = ProviderConfig::default();
        assert_eq!(from_config(&config).name(), "gemini");

        config.kind = ProviderKind::DeepSeek;
        assert_eq!(from_config(&config).name(), "deepseek");
    }
}
