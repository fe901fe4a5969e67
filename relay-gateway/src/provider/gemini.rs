//! Google Gemini provider.
//!
//! Sends one flattened prompt (instruction, history, closing directive) to the
//! `generateContent` endpoint and runs the reply through the formatter.

use super::{http_client, ProviderClient, ProviderError};
use crate::conversation::Message;
use crate::format::format_response;
use crate::prompt;
use async_trait::async_trait;
use relay_common::config::GeminiConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const NAME: &str = "gemini";

/// Gemini generation provider.
pub struct GeminiProvider {
    config: GeminiConfig,
    timeout: Duration,
    client: Client,
}

// ══════════════════════════════════════════════════════════════════════════════
// API REQUEST/RESPONSE TYPES
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "topP")]
    top_p: f64,
    #[serde(rename = "topK")]
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            client: http_client(timeout),
        }
    }

    fn build_request(&self, prompt: String) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
            },
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn system_prompt(&self) -> String {
        prompt::generation_system_prompt()
    }

    async fn send(
        &self,
        system_prompt: &str,
        conversation: &[Message],
    ) -> Result<String, ProviderError> {
        let start = Instant::now();

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::missing_key(NAME))?;

        let request = self.build_request(prompt::flatten_prompt(system_prompt, conversation));

        tracing::debug!(
            endpoint = %self.config.endpoint,
            history_len = conversation.len(),
            "Calling Gemini"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::transport(NAME, &e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Gemini returned an error status");
            return Err(ProviderError::upstream(NAME, status.as_u16(), &body));
        }

        let result: GenerateContentResponse = response.json().await.map_err(|e| {
            ProviderError::new(NAME, format!("Failed to parse response: {e}"))
        })?;

        if let Some(err) = result.error {
            return Err(ProviderError::new(NAME, format!("API Error: {}", err.message)));
        }

        let text = result
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                ProviderError::new(NAME, "Unexpected response shape: no candidate text")
            })?;
        if text.is_empty() {
            tracing::warn!("Gemini returned an empty reply");
            return Err(ProviderError::empty_reply(NAME));
        }

        tracing::debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Gemini replied"
        );

        Ok(format_response(&text))
    }
}
