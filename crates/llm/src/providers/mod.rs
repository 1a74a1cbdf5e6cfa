//! Vendor implementations of [`TextGenerator`](crate::client::TextGenerator).
//!
//! The clients share the HTTP plumbing below, including the mapping from
//! HTTP status to [`ProviderErrorKind`].

pub mod anthropic;
pub mod cohere;
pub mod google;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use cohere::CohereClient;
pub use google::GoogleClient;
pub use openai::OpenAiClient;

use crate::client::GenerationRequest;
use postgen_core::{AppError, AppResult, ProviderErrorKind};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Build the HTTP client every provider uses.
pub(crate) fn http_client(provider: &str) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| {
            AppError::Config(format!(
                "Failed to create HTTP client for {}: {}",
                provider, e
            ))
        })
}

/// Normalize a configured base URL.
pub(crate) fn base_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}

/// Reject requests that would waste a vendor call.
pub(crate) fn ensure_prompt(request: &GenerationRequest) -> AppResult<()> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::Prompt(
            "Refusing to send an empty prompt".to_string(),
        ));
    }
    Ok(())
}

/// Map a failed send to a transport error.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> AppError {
    tracing::error!(provider, error = %err, "Failed to reach LLM provider");
    AppError::provider(
        provider,
        ProviderErrorKind::Transport,
        format!("Failed to send request: {}", err),
    )
}

/// Pass successful responses through; classify the rest.
pub(crate) async fn check_status(provider: &str, response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    tracing::error!(
        provider,
        status = %status,
        error = %error_text,
        "LLM provider returned error status"
    );
    Err(classify_status(provider, status, &error_text))
}

/// Classify a non-success HTTP status.
pub(crate) fn classify_status(provider: &str, status: StatusCode, body: &str) -> AppError {
    let kind = match status.as_u16() {
        401 | 403 => ProviderErrorKind::Authentication,
        402 => ProviderErrorKind::Quota,
        429 if mentions_quota(body) => ProviderErrorKind::Quota,
        429 => ProviderErrorKind::RateLimited,
        _ => ProviderErrorKind::Api,
    };

    AppError::provider(provider, kind, format!("API error ({}): {}", status, body))
}

fn mentions_quota(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("insufficient_quota")
        || lower.contains("quota exceeded")
        || lower.contains("exceeded your current quota")
        || lower.contains("billing")
}

/// Decode a JSON body, reporting shape mismatches as malformed responses.
pub(crate) async fn parse_json<T: DeserializeOwned>(
    provider: &str,
    response: Response,
) -> AppResult<T> {
    response.json::<T>().await.map_err(|e| {
        tracing::error!(provider, error = %e, "Failed to parse LLM provider response");
        malformed(provider, format!("Failed to parse response: {}", e))
    })
}

pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> AppError {
    AppError::provider(provider, ProviderErrorKind::MalformedResponse, message)
}

/// Trim generated text; blank output is a failure.
pub(crate) fn finish_text(provider: &str, text: &str) -> AppResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::provider(
            provider,
            ProviderErrorKind::EmptyResponse,
            "Provider returned empty text",
        ));
    }
    Ok(trimmed.to_string())
}
