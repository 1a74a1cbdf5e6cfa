//! Anthropic provider implementation.
//!
//! Uses the messages API; the system prompt travels in the dedicated
//! `system` field rather than in the message list.

use super::{
    base_url, check_status, ensure_prompt, finish_text, http_client, parse_json, transport_error,
};
use crate::client::{GenerationRequest, TextGenerator};
use crate::profile::ProviderType;
use postgen_core::{AppResult, Secret};
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

/// Anthropic messages client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    base_url: String,
    api_key: Secret,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(api_key: Secret) -> AppResult<Self> {
        Self::with_base_url(api_key, ProviderType::Anthropic.default_endpoint())
    }

    pub fn with_base_url(api_key: Secret, url: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url(url),
            api_key,
            client: http_client(PROVIDER)?,
        })
    }

    fn to_messages_request(&self, request: &GenerationRequest) -> MessagesRequest {
        MessagesRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for AnthropicClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<String> {
        ensure_prompt(request)?;
        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "Sending message to Anthropic"
        );

        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", API_VERSION)
            .json(&self.to_messages_request(request))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let response = check_status(PROVIDER, response).await?;
        let body: MessagesResponse = parse_json(PROVIDER, response).await?;

        let text: String = body
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .map(|block| block.text.as_str())
            .collect();

        finish_text(PROVIDER, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ModelSettings;
    use postgen_core::ProviderErrorKind;

    fn request() -> GenerationRequest {
        GenerationRequest::new("Topic: AI ethics", "claude-3-opus", ModelSettings::new(4000, 0.7))
            .with_system("You write posts")
    }

    #[tokio::test]
    async fn test_generate_joins_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "ak-test")
            .match_header("anthropic-version", API_VERSION)
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "claude-3-opus",
                "max_tokens": 4000,
                "system": "You write posts",
                "messages": [{"role": "user", "content": "Topic: AI ethics"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content":[{"type":"text","text":"Ethics "},{"type":"tool_use","id":"x"},{"type":"text","text":"matter."}]}"#,
            )
            .create_async()
            .await;

        let client = AnthropicClient::with_base_url(Secret::new("ak-test"), server.url()).unwrap();
        let text = client.generate(&request()).await.unwrap();

        assert_eq!(text, "Ethics matter.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(429)
            .with_body(
                r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#,
            )
            .create_async()
            .await;

        let client = AnthropicClient::with_base_url(Secret::new("ak"), server.url()).unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_no_text_blocks_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content":[]}"#)
            .create_async()
            .await;

        let client = AnthropicClient::with_base_url(Secret::new("ak"), server.url()).unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::EmptyResponse));
    }
}
