//! Text generation abstraction and request type.
//!
//! This module defines the one contract every LLM vendor implements.

use crate::profile::{ModelSelection, ModelSettings};
use postgen_core::AppResult;

/// A single text generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The rendered prompt, sent verbatim
    pub prompt: String,

    /// Model identifier (e.g., "gpt-4", "claude-3-opus")
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: f32,

    /// System prompt (optional)
    pub system: Option<String>,
}

impl GenerationRequest {
    /// Create a new request with explicit generation parameters.
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        settings: ModelSettings,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            system: None,
        }
    }

    /// Create a request for the model chosen at startup.
    pub fn for_selection(prompt: impl Into<String>, selection: &ModelSelection) -> Self {
        Self::new(prompt, selection.model.clone(), selection.settings)
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Trait for text generation providers.
///
/// Implementations issue exactly one network call per `generate` and never
/// retry; retry policy belongs to the caller.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic").
    fn provider_name(&self) -> &str;

    /// Generate text for `request`.
    ///
    /// On success the returned text is non-empty and trimmed. Every vendor
    /// failure is reported as `AppError::Provider` with a classified kind.
    async fn generate(&self, request: &GenerationRequest) -> AppResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProviderType;

    #[test]
    fn test_request_for_selection() {
        let selection = ModelSelection {
            provider: ProviderType::Anthropic,
            model: "claude-2".to_string(),
            settings: ModelSettings::new(3000, 0.7),
        };

        let request = GenerationRequest::for_selection("Topic: Rust", &selection)
            .with_system("Be brief");

        assert_eq!(request.model, "claude-2");
        assert_eq!(request.max_tokens, 3000);
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.system.as_deref(), Some("Be brief"));
    }
}
