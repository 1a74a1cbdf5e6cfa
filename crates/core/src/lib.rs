//! Postgen Core Library
//!
//! This crate provides the foundational utilities shared by every Postgen crate:
//! - Error handling (`AppError`, `AppResult`, `ProviderErrorKind`)
//! - Logging infrastructure
//! - Configuration management
//! - Redacted credentials (`Secret`)

pub mod config;
pub mod error;
pub mod logging;
pub mod secret;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, ProviderErrorKind};
pub use secret::Secret;
