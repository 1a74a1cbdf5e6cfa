//! Cohere provider implementation.
//!
//! The `generate` endpoint has no system field. The rendered prompt is sent
//! unchanged and any system prompt is dropped.

use super::{
    base_url, check_status, ensure_prompt, finish_text, http_client, malformed, parse_json,
    transport_error,
};
use crate::client::{GenerationRequest, TextGenerator};
use crate::profile::ProviderType;
use postgen_core::{AppResult, Secret};
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "cohere";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    generations: Vec<Generation>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    text: String,
}

/// Cohere generate client.
#[derive(Debug, Clone)]
pub struct CohereClient {
    base_url: String,
    api_key: Secret,
    client: reqwest::Client,
}

impl CohereClient {
    pub fn new(api_key: Secret) -> AppResult<Self> {
        Self::with_base_url(api_key, ProviderType::Cohere.default_endpoint())
    }

    pub fn with_base_url(api_key: Secret, url: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url(url),
            api_key,
            client: http_client(PROVIDER)?,
        })
    }

    fn to_generate_request(&self, request: &GenerationRequest) -> GenerateRequest {
        if request.system.is_some() {
            tracing::debug!("Cohere generate has no system field; skipping system prompt");
        }

        GenerateRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for CohereClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<String> {
        ensure_prompt(request)?;
        tracing::debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "Sending generate to Cohere"
        );

        let url = format!("{}/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&self.to_generate_request(request))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let response = check_status(PROVIDER, response).await?;
        let body: GenerateResponse = parse_json(PROVIDER, response).await?;

        let generation = body
            .generations
            .into_iter()
            .next()
            .ok_or_else(|| malformed(PROVIDER, "No generations in response"))?;

        finish_text(PROVIDER, &generation.text)
    }
}
