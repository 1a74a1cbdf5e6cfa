//! Error types for Postgen.
//!
//! One enum covers every failure category in the application. The three
//! categories the processing loop reacts to are kept distinct:
//! - `Config`: fatal, raised before the loop starts
//! - `Source`: spreadsheet failures, recovered per cycle
//! - `Provider`: text generation failures, recovered per topic

use std::fmt;
use thiserror::Error;

/// Unified error type for Postgen.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid provider, model, credential or other startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Spreadsheet read/write failures (auth, transport, malformed range)
    #[error("Sheet error: {0}")]
    Source(String),

    /// LLM vendor failures, classified by `kind`
    #[error("LLM error ({provider}, {kind}): {message}")]
    Provider {
        provider: String,
        kind: ProviderErrorKind,
        message: String,
    },

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),
}

/// Classification of a text generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The request never produced an HTTP response
    Transport,
    /// The vendor rejected the credential (401/403)
    Authentication,
    /// The vendor asked us to slow down (429)
    RateLimited,
    /// Billing or quota exhausted
    Quota,
    /// Any other non-success status
    Api,
    /// The response body did not have the expected shape
    MalformedResponse,
    /// The vendor answered with blank text
    EmptyResponse,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Authentication => "authentication",
            Self::RateLimited => "rate-limited",
            Self::Quota => "quota",
            Self::Api => "api",
            Self::MalformedResponse => "malformed-response",
            Self::EmptyResponse => "empty-response",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppError {
    /// Build a provider error.
    pub fn provider(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        AppError::Provider {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    /// The provider failure classification, if this is a provider error.
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            AppError::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the failing call may succeed if repeated after a pause.
    pub fn is_rate_limited(&self) -> bool {
        self.provider_kind() == Some(ProviderErrorKind::RateLimited)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
