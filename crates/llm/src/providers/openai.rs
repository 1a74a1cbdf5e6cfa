//! OpenAI provider implementation.
//!
//! Uses the chat completions endpoint with an optional system message.
//! API: https://platform.openai.com/docs/api-reference/chat

use super::{
    base_url, check_status, ensure_prompt, finish_text, http_client, malformed, parse_json,
    transport_error,
};
use crate::client::{GenerationRequest, TextGenerator};
use crate::profile::ProviderType;
use postgen_core::{AppResult, Secret};
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "openai";

/// OpenAI API request format.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    /// Base URL for the OpenAI API
    base_url: String,

    api_key: Secret,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client for the public OpenAI API.
    pub fn new(api_key: Secret) -> AppResult<Self> {
        Self::with_base_url(api_key, ProviderType::OpenAI.default_endpoint())
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(api_key: Secret, url: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url(url),
            api_key,
            client: http_client(PROVIDER)?,
        })
    }

    /// Convert a GenerationRequest to OpenAI format.
    fn to_chat_request(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: Some(system.clone()),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: Some(request.prompt.clone()),
        });

        ChatRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for OpenAiClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<String> {
        ensure_prompt(request)?;
        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "Sending chat completion to OpenAI"
        );

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&self.to_chat_request(request))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let response = check_status(PROVIDER, response).await?;
        let body: ChatResponse = parse_json(PROVIDER, response).await?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| malformed(PROVIDER, "No message content in response"))?;

        finish_text(PROVIDER, &content)
    }
}
