//! Google Gemini provider implementation.
//!
//! Calls `models/{model}:generateContent`. The key goes in the
//! `x-goog-api-key` header so it never appears in a logged URL.

use super::{
    base_url, check_status, ensure_prompt, finish_text, http_client, malformed, parse_json,
    transport_error,
};
use crate::client::{GenerationRequest, TextGenerator};
use crate::profile::ProviderType;
use postgen_core::{AppResult, Secret};
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "google";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    base_url: String,
    api_key: Secret,
    client: reqwest::Client,
}

impl GoogleClient {
    pub fn new(api_key: Secret) -> AppResult<Self> {
        Self::with_base_url(api_key, ProviderType::Google.default_endpoint())
    }

    pub fn with_base_url(api_key: Secret, url: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url(url),
            api_key,
            client: http_client(PROVIDER)?,
        })
    }

    fn to_generate_request(&self, request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: request.system.as_ref().map(|system| Content {
                role: None,
                parts: vec![Part {
                    text: system.clone(),
                }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for GoogleClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<String> {
        ensure_prompt(request)?;
        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "Sending generateContent to Gemini"
        );

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&self.to_generate_request(request))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let response = check_status(PROVIDER, response).await?;
        let body: GenerateContentResponse = parse_json(PROVIDER, response).await?;

        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| malformed(PROVIDER, "No candidates in response"))?;

        if let Some(reason) = &candidate.finish_reason {
            tracing::debug!(finish_reason = %reason, "Gemini candidate finished");
        }

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        finish_text(PROVIDER, &text)
    }
}
