//! DeepSeek provider (OpenAI-compatible chat completions).
//!
//! Sends the role-tagged conversation behind a synthesized system message.
//! The reply is returned verbatim; it does not go through the formatter.

use super::{http_client, ProviderClient, ProviderError};
use crate::conversation::{Message, Role};
use crate::prompt;
use async_trait::async_trait;
use relay_common::config::DeepSeekConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const NAME: &str = "deepseek";

/// DeepSeek chat-completion provider.
pub struct DeepSeekProvider {
    config: DeepSeekConfig,
    timeout: Duration,
    client: Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionResponseMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponseMessage {
    content: Option<String>,
}

impl DeepSeekProvider {
    pub fn new(config: DeepSeekConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            client: http_client(timeout),
        }
    }

    fn build_request<'a>(
        &'a self,
        system_prompt: &'a str,
        conversation: &'a [Message],
    ) -> CompletionRequest<'a> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(CompletionMessage {
            role: Role::System,
            content: system_prompt,
        });
        messages.extend(conversation.iter().map(|m| CompletionMessage {
            role: m.role,
            content: &m.content,
        }));

        CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl ProviderClient for DeepSeekProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn system_prompt(&self) -> String {
        prompt::chat_system_prompt()
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

        let request = self.build_request(system_prompt, conversation);

        tracing::debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            history_len = conversation.len(),
            "Calling DeepSeek"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::transport(NAME, &e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "DeepSeek returned an error status");
            return Err(ProviderError::upstream(NAME, status.as_u16(), &body));
        }

        let result: CompletionResponse = response.json().await.map_err(|e| {
            ProviderError::new(NAME, format!("Failed to parse response: {e}"))
        })?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::new(NAME, "Unexpected response shape: no choice content")
            })?;
        if content.is_empty() {
            tracing::warn!("DeepSeek returned an empty reply");
            return Err(ProviderError::empty_reply(NAME));
        }

        tracing::debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "DeepSeek replied"
        );

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> DeepSeekProvider {
        let config = DeepSeekConfig {
            api_key: Some("ds-key".into()),
            endpoint: format!("{}/v1/chat/completions", server.uri()),
            ..DeepSeekConfig::default()
        };
        DeepSeekProvider::new(config, Duration::from_secs(5))
    }

    fn reply(text: &str) -> serde_json::Value {
        json!({
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": text } }
            ]
        })
    }

    #[tokio::test]
    async fn sends_system_message_then_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer ds-key"))
            .and(body_partial_json(json!({
                "model": "deepseek-r1-chat",
                "temperature": 0.7,
                "max_tokens": 800,
                "messages": [
                    { "role": "system", "content": "SYS" },
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "hi" },
                    { "role": "user", "content": "services?" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("We build AI apps.")))
            .expect(1)
            .mount(&server)
            .await;

        let history = [
            Message::user("hello"),
            Message::assistant("hi"),
            Message::user("services?"),
        ];
        let text = provider_for(&server).send("SYS", &history).await.unwrap();
        assert_eq!(text, "We build AI apps.");
    }

    #[tokio::test]
    async fn reply_is_returned_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("* raw *bullet*")))
            .mount(&server)
            .await;

        let text = provider_for(&server)
            .send("SYS", &[Message::user("q")])
            .await
            .unwrap();
        assert_eq!(text, "* raw *bullet*");
    }

    #[tokio::test]
    async fn error_status_embeds_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid key"}"#),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .send("SYS", &[Message::user("q")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), r#"API Error: 401 - {"error":"invalid key"}"#);
        assert_eq!(err.status_code, Some(401));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .send("SYS", &[Message::user("q")])
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Unexpected response shape"));
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("")))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .send("SYS", &[Message::user("q")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), crate::provider::UNKNOWN_API_ERROR);
    }

    #[test]
    fn system_prompt_has_no_bullet_directive() {
        let provider = DeepSeekProvider::new(DeepSeekConfig::default(), Duration::from_secs(1));
        let system = provider.system_prompt();
        assert!(!system.contains(prompt::BULLET_DIRECTIVE));
        assert!(system.contains(prompt::BUSINESS_CONTEXT));
    }
}
