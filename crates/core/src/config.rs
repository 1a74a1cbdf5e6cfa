//! Configuration management for Postgen.
//!
//! Configuration is assembled once at startup from three layers, later
//! layers winning:
//! - Built-in defaults
//! - An optional YAML file (`postgen.yaml` or `$POSTGEN_CONFIG`)
//! - Environment variables
//!
//! Provider catalogs and credentials are resolved by `postgen-llm` from the
//! overrides collected here.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;
use crate::secret::Secret;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "postgen.yaml";

/// Placeholder the prompt template substitutes the topic text into.
pub const TOPIC_PLACEHOLDER: &str = "{topic}";

/// Prompt used when none is configured.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "
Generate a LinkedIn post about {topic}. The post should be:
1. Professional and engaging
2. Technically accurate
3. Include relevant industry insights
4. End with 3-5 relevant hashtags

The post should be unique and written in a conversational yet professional tone.
Ensure the content is factual and provides value to the reader.

Additional guidelines:
- Start with a hook to grab attention
- Include specific examples or data points when possible
- Break up text into readable paragraphs
- Use emojis sparingly and professionally
- Keep the overall length suitable for LinkedIn
";

/// System prompt sent alongside every generation request.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a professional content creator specializing in creating engaging LinkedIn posts.";

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Selected LLM provider (e.g., "openai", "anthropic")
    pub provider: String,

    /// Selected model; `None` means the provider's default model
    pub model: Option<String>,

    /// Per-provider catalog overrides from the config file
    pub providers: HashMap<String, ProviderOverride>,

    /// Spreadsheet settings
    pub sheet: SheetConfig,

    /// Prompt settings
    pub prompt: PromptConfig,

    /// Processing loop timing
    pub timing: LoopConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Disable colored output
    pub no_color: bool,

    /// Log line format
    pub log_format: LogFormat,
}

/// Overrides for one provider's built-in profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderOverride {
    /// Environment variable holding the API key
    #[serde(rename = "apiKeyEnv", default)]
    pub api_key_env: Option<String>,

    /// Base URL of the vendor API
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model used when none is selected
    #[serde(rename = "defaultModel", default)]
    pub default_model: Option<String>,

    /// Extra or replacement catalog entries
    #[serde(default)]
    pub models: HashMap<String, ModelOverride>,
}

/// Generation parameters for one catalog entry.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ModelOverride {
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Spreadsheet settings.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    /// Spreadsheet identifier (from the sheet URL)
    pub id: String,

    /// A1 range holding topic, status and content columns
    pub range: String,

    /// JSON token file maintained by the external OAuth flow
    pub token_file: Option<PathBuf>,

    /// Literal bearer token; takes precedence over `token_file`
    pub token: Option<Secret>,

    /// Sheets API base URL override
    pub endpoint: Option<String>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            range: "A2:C".to_string(),
            token_file: Some(PathBuf::from("token.json")),
            token: None,
            endpoint: None,
        }
    }
}

/// Prompt settings.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Template source containing the topic placeholder
    pub template: String,

    /// System prompt; `None` sends no system instruction
    pub system: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            system: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

/// Processing loop timing.
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Wait after a cycle, whether or not topics were found
    pub idle_interval_secs: u64,

    /// Wait between consecutive topics of a batch
    pub pacing_delay_secs: u64,

    /// Wait after a failed cycle
    pub error_backoff_secs: u64,

    /// Extra attempts for a rate-limited generation
    pub rate_limit_retries: u32,

    /// First rate-limit backoff, doubled on each attempt
    pub rate_limit_backoff_secs: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            idle_interval_secs: 300,
            pacing_delay_secs: 2,
            error_backoff_secs: 300,
            rate_limit_retries: 3,
            rate_limit_backoff_secs: 2,
        }
    }
}

impl LoopConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_secs(self.pacing_delay_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_backoff_secs)
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    sheet: Option<SheetSection>,
    prompt: Option<PromptSection>,
    #[serde(rename = "loop")]
    timing: Option<LoopSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    #[serde(default)]
    providers: HashMap<String, ProviderOverride>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetSection {
    id: Option<String>,
    range: Option<String>,
    token_file: Option<PathBuf>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptSection {
    template: Option<String>,
    template_file: Option<PathBuf>,
    system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoopSection {
    idle_interval_secs: Option<u64>,
    pacing_delay_secs: Option<u64>,
    error_backoff_secs: Option<u64>,
    rate_limit_retries: Option<u32>,
    rate_limit_backoff_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "openai".to_string(),
            model: None,
            providers: HashMap::new(),
            sheet: SheetConfig::default(),
            prompt: PromptConfig::default(),
            timing: LoopConfig::default(),
            log_level: None,
            no_color: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment and defaults.
    ///
    /// Environment variables:
    /// - `POSTGEN_CONFIG`: Path to config file
    /// - `POSTGEN_PROVIDER`: LLM provider (falls back to `LLM_PROVIDER`)
    /// - `POSTGEN_MODEL`: Model identifier (falls back to `LLM_MODEL`)
    /// - `POSTGEN_SHEET_ID`: Spreadsheet identifier
    /// - `POSTGEN_SHEET_RANGE`: A1 range of the topic rows
    /// - `POSTGEN_SHEETS_TOKEN`: Literal Sheets bearer token
    /// - `POSTGEN_SHEETS_TOKEN_FILE`: Sheets token file
    /// - `POSTGEN_PROMPT_FILE`: Prompt template file
    /// - `POSTGEN_LOG_FORMAT`: `pretty` or `json`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use postgen_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Provider: {}", config.provider);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load configuration resolving environment variables through `lookup`.
    pub fn load_from<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let explicit = lookup("POSTGEN_CONFIG").map(PathBuf::from);
        let config_path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        } else if explicit.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Some(provider) = lookup("POSTGEN_PROVIDER").or_else(|| lookup("LLM_PROVIDER")) {
            config.provider = provider;
        }

        if let Some(model) = lookup("POSTGEN_MODEL").or_else(|| lookup("LLM_MODEL")) {
            config.model = Some(model);
        }

        if let Some(id) = lookup("POSTGEN_SHEET_ID") {
            config.sheet.id = id;
        }

        if let Some(range) = lookup("POSTGEN_SHEET_RANGE") {
            config.sheet.range = range;
        }

        if let Some(token_file) = lookup("POSTGEN_SHEETS_TOKEN_FILE") {
            config.sheet.token_file = Some(PathBuf::from(token_file));
        }

        config.sheet.token = lookup("POSTGEN_SHEETS_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(Secret::new);

        if let Some(path) = lookup("POSTGEN_PROMPT_FILE") {
            config.prompt.template = read_template_file(Path::new(&path))?;
        }

        if let Some(format) = lookup("POSTGEN_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        if let Some(level) = lookup("RUST_LOG") {
            config.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        self.config_file = Some(path.to_path_buf());

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                self.provider = provider;
            }
            if llm.model.is_some() {
                self.model = llm.model;
            }
            self.providers = llm
                .providers
                .into_iter()
                .map(|(name, value)| (name.to_lowercase(), value))
                .collect();
        }

        if let Some(sheet) = config_file.sheet {
            if let Some(id) = sheet.id {
                self.sheet.id = id;
            }
            if let Some(range) = sheet.range {
                self.sheet.range = range;
            }
            if sheet.token_file.is_some() {
                self.sheet.token_file = sheet.token_file;
            }
            if sheet.endpoint.is_some() {
                self.sheet.endpoint = sheet.endpoint;
            }
        }

        if let Some(prompt) = config_file.prompt {
            if let Some(file) = prompt.template_file {
                self.prompt.template = read_template_file(&file)?;
            } else if let Some(template) = prompt.template {
                self.prompt.template = template;
            }
            if let Some(system) = prompt.system {
                self.prompt.system = if system.trim().is_empty() {
                    None
                } else {
                    Some(system)
                };
            }
        }

        if let Some(timing) = config_file.timing {
            let t = &mut self.timing;
            t.idle_interval_secs = timing.idle_interval_secs.unwrap_or(t.idle_interval_secs);
            t.pacing_delay_secs = timing.pacing_delay_secs.unwrap_or(t.pacing_delay_secs);
            t.error_backoff_secs = timing.error_backoff_secs.unwrap_or(t.error_backoff_secs);
            t.rate_limit_retries = timing.rate_limit_retries.unwrap_or(t.rate_limit_retries);
            t.rate_limit_backoff_secs = timing
                .rate_limit_backoff_secs
                .unwrap_or(t.rate_limit_backoff_secs);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(format) = logging.format {
                self.log_format = format.parse()?;
            }
        }

        Ok(())
    }

    /// Validate settings that do not depend on the provider catalog.
    pub fn validate(&self) -> AppResult<()> {
        if self.sheet.id.trim().is_empty() {
            return Err(AppError::Config(
                "Sheet id is not configured. Set POSTGEN_SHEET_ID or sheet.id".to_string(),
            ));
        }

        if self.sheet.range.trim().is_empty() {
            return Err(AppError::Config("Sheet range is empty".to_string()));
        }

        if self.sheet.token.is_none() && self.sheet.token_file.is_none() {
            return Err(AppError::Config(
                "No Sheets credential configured. Set POSTGEN_SHEETS_TOKEN or sheet.tokenFile"
                    .to_string(),
            ));
        }

        if self.prompt.template.trim().is_empty() {
            return Err(AppError::Config("Prompt template is empty".to_string()));
        }

        Ok(())
    }
}

fn read_template_file(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read prompt template {:?}: {}", path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, None);
        assert_eq!(config.sheet.range, "A2:C");
        assert_eq!(config.timing.idle_interval_secs, 300);
        assert_eq!(config.timing.pacing_delay_secs, 2);
        assert!(config.prompt.template.contains(TOPIC_PLACEHOLDER));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::load_from(lookup_from(&[
            ("POSTGEN_PROVIDER", "anthropic"),
            ("POSTGEN_MODEL", "claude-2"),
            ("POSTGEN_SHEET_ID", "sheet-123"),
            ("POSTGEN_SHEETS_TOKEN", "ya29.token"),
            ("POSTGEN_LOG_FORMAT", "json"),
            ("NO_COLOR", "1"),
        ]))
        .unwrap();

        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.model.as_deref(), Some("claude-2"));
        assert_eq!(config.sheet.id, "sheet-123");
        assert_eq!(config.sheet.token.as_ref().map(Secret::expose), Some("ya29.token"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.no_color);
    }

    #[test]
    fn test_legacy_llm_env_fallbacks() {
        let config = AppConfig::load_from(lookup_from(&[
            ("LLM_PROVIDER", "google"),
            ("LLM_MODEL", "gemini-pro"),
        ]))
        .unwrap();
        assert_eq!(config.provider, "google");
        assert_eq!(config.model.as_deref(), Some("gemini-pro"));

        let config = AppConfig::load_from(lookup_from(&[
            ("POSTGEN_PROVIDER", "anthropic"),
            ("LLM_PROVIDER", "google"),
            ("POSTGEN_MODEL", "claude-2"),
            ("LLM_MODEL", "gemini-pro"),
        ]))
        .unwrap();
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.model.as_deref(), Some("claude-2"));
    }

    #[test]
    fn test_yaml_then_env_precedence() {
        let file = write_yaml(
            r#"
llm:
  provider: cohere
  model: command-light
  providers:
    Cohere:
      endpoint: http://localhost:9000
      models:
        command-r: { maxTokens: 1000, temperature: 0.3 }
sheet:
  id: from-yaml
  range: Posts!A5:C
prompt:
  template: "Topic: {topic}"
  system: ""
loop:
  idleIntervalSecs: 60
  rateLimitRetries: 1
logging:
  level: debug
  color: false
"#,
        );
        let path = file.path().to_string_lossy().to_string();

        let config = AppConfig::load_from(lookup_from(&[
            ("POSTGEN_CONFIG", path.as_str()),
            ("POSTGEN_SHEET_ID", "from-env"),
        ]))
        .unwrap();

        assert_eq!(config.provider, "cohere");
        assert_eq!(config.model.as_deref(), Some("command-light"));
        assert_eq!(config.sheet.id, "from-env");
        assert_eq!(config.sheet.range, "Posts!A5:C");
        assert_eq!(config.prompt.template, "Topic: {topic}");
        assert_eq!(config.prompt.system, None);
        assert_eq!(config.timing.idle_interval_secs, 60);
        assert_eq!(config.timing.pacing_delay_secs, 2);
        assert_eq!(config.timing.rate_limit_retries, 1);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.no_color);

        let cohere = &config.providers["cohere"];
        assert_eq!(cohere.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cohere.models["command-r"].max_tokens, 1000);
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let result = AppConfig::load_from(lookup_from(&[(
            "POSTGEN_CONFIG",
            "/definitely/not/here/postgen.yaml",
        )]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_prompt_file_override() {
        let template = write_yaml("Write about {topic} in one line.");
        let path = template.path().to_string_lossy().to_string();

        let config =
            AppConfig::load_from(lookup_from(&[("POSTGEN_PROMPT_FILE", path.as_str())])).unwrap();
        assert_eq!(config.prompt.template, "Write about {topic} in one line.");
    }

    #[test]
    fn test_validate_requires_sheet_id() {
        let config = AppConfig::default();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = AppConfig::default();
        config.sheet.id = "abc".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_sheet_credential() {
        let mut config = AppConfig::default();
        config.sheet.id = "abc".to_string();
        config.sheet.token_file = None;
        assert!(config.validate().is_err());

        config.sheet.token = Some(Secret::new("token"));
        assert!(config.validate().is_ok());
    }
}
