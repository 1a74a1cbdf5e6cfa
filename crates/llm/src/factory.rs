//! Text generator factory.
//!
//! Maps a provider name to its client implementation, wiring in the
//! credential and endpoint from the profile table. Construction never
//! touches the network; a bad key only shows up on first use.

use crate::client::TextGenerator;
use crate::profile::{ProfileTable, ProviderType};
use crate::providers::{AnthropicClient, CohereClient, GoogleClient, OpenAiClient};
use postgen_core::AppResult;
use std::sync::Arc;

/// Create the text generator for `provider`.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "anthropic", "google", "cohere")
/// * `profiles` - Profile table holding credentials and endpoints
///
/// # Errors
/// Returns `AppError::Config` if:
/// - Provider is unknown
/// - The provider's credential is empty
pub fn create_generator(
    provider: &str,
    profiles: &ProfileTable,
) -> AppResult<Arc<dyn TextGenerator>> {
    let profile = profiles.resolve(provider)?;
    let api_key = profile.require_credential()?.clone();
    let endpoint = profile.endpoint.clone();

    tracing::debug!(
        provider = profile.provider.as_str(),
        endpoint = %endpoint,
        "Creating text generator"
    );

    let generator: Arc<dyn TextGenerator> = match profile.provider {
        ProviderType::OpenAI => Arc::new(OpenAiClient::with_base_url(api_key, endpoint)?),
        ProviderType::Anthropic => Arc::new(AnthropicClient::with_base_url(api_key, endpoint)?),
        ProviderType::Google => Arc::new(GoogleClient::with_base_url(api_key, endpoint)?),
        ProviderType::Cohere => Arc::new(CohereClient::with_base_url(api_key, endpoint)?),
    };

    Ok(generator)
}
