//! Provider profiles: credentials and model catalogs.
//!
//! Each supported vendor has a built-in profile listing the models it can
//! serve with their default token budget and temperature. Profiles are
//! merged with config file overrides and credentials once at startup and
//! are immutable afterwards.

use postgen_core::config::{AppConfig, ProviderOverride};
use postgen_core::{AppError, AppResult, Secret};
use std::collections::{BTreeMap, HashMap};

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Google,
    Cohere,
}

impl ProviderType {
    /// Every registered provider.
    pub const ALL: [ProviderType; 4] = [
        ProviderType::OpenAI,
        ProviderType::Anthropic,
        ProviderType::Google,
        ProviderType::Cohere,
    ];

    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "google" | "gemini" => Some(Self::Google),
            "cohere" => Some(Self::Cohere),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Cohere => "cohere",
        }
    }

    /// Environment variable the credential is read from by default.
    pub fn default_credential_env(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Google => "GOOGLE_AI_API_KEY",
            Self::Cohere => "COHERE_API_KEY",
        }
    }

    /// Public API base URL.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Google => "https://generativelanguage.googleapis.com/v1beta",
            Self::Cohere => "https://api.cohere.ai/v1",
        }
    }

    fn known_names() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Generation parameters for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSettings {
    /// Token budget, always > 0
    pub max_tokens: u32,
    /// Sampling temperature in [0, 2]
    pub temperature: f32,
}

impl ModelSettings {
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }

    fn validate(&self, provider: ProviderType, model: &str) -> AppResult<()> {
        if self.max_tokens == 0 {
            return Err(AppError::Config(format!(
                "Model '{}' for provider '{}' has max_tokens = 0",
                model,
                provider.as_str()
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "Model '{}' for provider '{}' has temperature {} outside [0, 2]",
                model,
                provider.as_str(),
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Static description of one vendor.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub provider: ProviderType,

    /// Environment variable the credential was looked up in
    pub credential_env: String,

    /// API key; empty when the variable was unset
    pub credential: Secret,

    /// API base URL
    pub endpoint: String,

    /// Supported models
    pub models: BTreeMap<String, ModelSettings>,

    /// Model used when none is selected
    pub default_model: String,
}

impl ProviderProfile {
    /// Built-in catalog entry for `provider`, without a credential.
    pub fn builtin(provider: ProviderType) -> Self {
        let (models, default_model): (Vec<(&str, ModelSettings)>, &str) = match provider {
            ProviderType::OpenAI => (
                vec![
                    ("gpt-4", ModelSettings::new(3000, 0.7)),
                    ("gpt-4-turbo", ModelSettings::new(4000, 0.7)),
                    ("gpt-3.5-turbo", ModelSettings::new(2000, 0.7)),
                ],
                "gpt-4",
            ),
            ProviderType::Anthropic => (
                vec![
                    ("claude-3-opus", ModelSettings::new(4000, 0.7)),
                    ("claude-3-sonnet", ModelSettings::new(3000, 0.7)),
                    ("claude-2", ModelSettings::new(3000, 0.7)),
                ],
                "claude-3-opus",
            ),
            ProviderType::Google => (
                vec![("gemini-pro", ModelSettings::new(2048, 0.7))],
                "gemini-pro",
            ),
            ProviderType::Cohere => (
                vec![
                    ("command", ModelSettings::new(2048, 0.7)),
                    ("command-light", ModelSettings::new(2048, 0.7)),
                ],
                "command",
            ),
        };

        Self {
            provider,
            credential_env: provider.default_credential_env().to_string(),
            credential: Secret::default(),
            endpoint: provider.default_endpoint().to_string(),
            models: models
                .into_iter()
                .map(|(name, settings)| (name.to_string(), settings))
                .collect(),
            default_model: default_model.to_string(),
        }
    }

    /// Set the API key.
    pub fn with_credential(mut self, credential: impl Into<Secret>) -> Self {
        self.credential = credential.into();
        self
    }

    /// Apply config file overrides.
    fn apply_override(&mut self, value: &ProviderOverride) {
        if let Some(env) = &value.api_key_env {
            self.credential_env = env.clone();
        }
        if let Some(endpoint) = &value.endpoint {
            self.endpoint = endpoint.clone();
        }
        for (name, model) in &value.models {
            self.models.insert(
                name.clone(),
                ModelSettings::new(model.max_tokens, model.temperature),
            );
        }
        if let Some(default_model) = &value.default_model {
            self.default_model = default_model.clone();
        }
    }

    /// Look up a model in the catalog.
    pub fn model(&self, name: &str) -> AppResult<ModelSettings> {
        self.models.get(name).copied().ok_or_else(|| {
            AppError::Config(format!(
                "Invalid model '{}' for provider '{}'. Available models: {}",
                name,
                self.provider.as_str(),
                self.models.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Check the catalog invariants (credential checked separately).
    pub fn validate_catalog(&self) -> AppResult<()> {
        self.model(&self.default_model).map_err(|_| {
            AppError::Config(format!(
                "Default model '{}' is not in the '{}' catalog",
                self.default_model,
                self.provider.as_str()
            ))
        })?;

        for (name, settings) in &self.models {
            settings.validate(self.provider, name)?;
        }

        Ok(())
    }

    /// Fail unless an API key is present.
    pub fn require_credential(&self) -> AppResult<&Secret> {
        if self.credential.is_blank() {
            return Err(AppError::Config(format!(
                "API key not found for {}. Set the {} environment variable",
                self.provider.as_str(),
                self.credential_env
            )));
        }
        Ok(&self.credential)
    }
}

/// All provider profiles, keyed by provider.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: HashMap<ProviderType, ProviderProfile>,
}

impl ProfileTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// The built-in catalog without credentials.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for provider in ProviderType::ALL {
            table.insert(ProviderProfile::builtin(provider));
        }
        table
    }

    /// Build the table from configuration, resolving credentials through `lookup`.
    pub fn from_config<F>(config: &AppConfig, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in config.providers.keys() {
            if ProviderType::parse(name).is_none() {
                return Err(AppError::Config(format!(
                    "Overrides given for unknown provider: {}. Supported: {}",
                    name,
                    ProviderType::known_names()
                )));
            }
        }

        let mut table = Self::empty();
        for provider in ProviderType::ALL {
            let mut profile = ProviderProfile::builtin(provider);
            for (name, value) in &config.providers {
                if ProviderType::parse(name) == Some(provider) {
                    profile.apply_override(value);
                }
            }
            if let Some(key) = lookup(&profile.credential_env) {
                profile.credential = Secret::new(key.trim());
            }
            table.insert(profile);
        }

        Ok(table)
    }

    /// Add or replace a profile.
    pub fn insert(&mut self, profile: ProviderProfile) {
        self.profiles.insert(profile.provider, profile);
    }

    /// Profile for a provider, if registered.
    pub fn get(&self, provider: ProviderType) -> Option<&ProviderProfile> {
        self.profiles.get(&provider)
    }

    /// Profile for a provider name, failing with a configuration error.
    pub fn resolve(&self, provider_name: &str) -> AppResult<&ProviderProfile> {
        ProviderType::parse(provider_name)
            .and_then(|provider| self.get(provider))
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid LLM provider: {}. Available providers: {}",
                    provider_name,
                    ProviderType::known_names()
                ))
            })
    }
}

/// The provider and model chosen for this run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub provider: ProviderType,
    pub model: String,
    pub settings: ModelSettings,
}

/// Resolve the configured provider and model against the catalog.
///
/// Fails with `AppError::Config` when the provider is unknown, the catalog
/// is inconsistent, the model is not offered, or the credential is missing.
pub fn select_model(
    table: &ProfileTable,
    provider_name: &str,
    model: Option<&str>,
) -> AppResult<ModelSelection> {
    let profile = table.resolve(provider_name)?;
    profile.validate_catalog()?;

    let model = model.unwrap_or(&profile.default_model);
    let settings = profile.model(model)?;
    profile.require_credential()?;

    Ok(ModelSelection {
        provider: profile.provider,
        model: model.to_string(),
        settings,
    })
}
