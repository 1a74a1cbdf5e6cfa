//! Logging infrastructure for Postgen.
//!
//! This module initializes the tracing subscriber for structured logging.
//! All logs are emitted to stderr; the operator reads them to follow the loop.

use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!(
                "Unknown log format: {}. Supported: pretty, json",
                other
            ))),
        }
    }
}

/// Initialize the tracing subscriber with stderr output.
///
/// # Arguments
/// * `log_level` - Optional log level override (e.g., "debug", "info")
/// * `no_color` - Disable colored output
/// * `format` - Pretty or JSON lines
///
/// # Example
/// ```no_run
/// use postgen_core::logging::{init_logging, LogFormat};
///
/// init_logging(None, false, LogFormat::Pretty).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool, format: LogFormat) -> AppResult<()> {
    let env_filter = build_filter(log_level)?;

    let result = match format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(!no_color && supports_color());

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
    };

    result.map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}

/// Resolve the filter from the explicit level, `RUST_LOG`, or `info`.
fn build_filter(log_level: Option<&str>) -> AppResult<EnvFilter> {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_str = log_level.unwrap_or(&default_level);

    EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter: {}", e)))
}

fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}
