//! Access tokens for the Sheets API.
//!
//! Obtaining a token (the OAuth consent flow) happens outside Postgen. We
//! only read a bearer token, either handed over directly or from a JSON
//! token file written by the OAuth helper. The file is re-read on every
//! request so an external refresh is picked up without a restart.

use chrono::{DateTime, Utc};
use postgen_core::{AppError, AppResult, Secret};
use serde::Deserialize;
use std::path::PathBuf;

/// Source of bearer tokens.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> AppResult<Secret>;
}

/// A fixed token, e.g. from `POSTGEN_SHEETS_TOKEN`.
#[derive(Debug, Clone)]
pub struct StaticToken(Secret);

impl StaticToken {
    pub fn new(token: impl Into<Secret>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> AppResult<Secret> {
        if self.0.is_blank() {
            return Err(AppError::Source("Sheets token is empty".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Token file contents. Google's OAuth client libraries write `token`.
#[derive(Debug, Deserialize)]
struct TokenFileContents {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    expiry: Option<String>,
}

/// A token read from a JSON file on each request.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(&self, raw: &str, now: DateTime<Utc>) -> AppResult<Secret> {
        let contents: TokenFileContents = serde_json::from_str(raw).map_err(|e| {
            AppError::Source(format!(
                "Token file {} is not valid: {}",
                self.path.display(),
                e
            ))
        })?;

        if let Some(expiry) = contents.expiry.as_deref() {
            match DateTime::parse_from_rfc3339(expiry) {
                Ok(at) if at.with_timezone(&Utc) <= now => {
                    return Err(AppError::Source(format!(
                        "Sheets credential expired at {}; refresh {}",
                        at,
                        self.path.display()
                    )));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Ignoring unparseable token expiry"
                    );
                }
            }
        }

        let token = Secret::new(contents.access_token.trim());
        if token.is_blank() {
            return Err(AppError::Source(format!(
                "Token file {} has an empty access token",
                self.path.display()
            )));
        }
        Ok(token)
    }
}

#[async_trait::async_trait]
impl TokenProvider for TokenFile {
    async fn access_token(&self) -> AppResult<Secret> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Source(format!(
                "Failed to read token file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        self.parse(&raw, Utc::now())
    }
}
