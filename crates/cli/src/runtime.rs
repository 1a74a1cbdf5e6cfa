//! Startup wiring.
//!
//! Everything that can be wrong with the configuration is checked here,
//! before the processing loop starts. Any failure is an `AppError::Config`
//! and the process exits without touching the sheet or the LLM vendor.

use postgen_core::config::SheetConfig;
use postgen_core::logging::{self, LogFormat};
use postgen_core::{AppConfig, AppError, AppResult};
use postgen_llm::{create_generator, select_model, ModelSelection, ProfileTable};
use postgen_pipeline::Processor;
use postgen_prompt::PromptTemplate;
use postgen_sheets::{GoogleSheetsSource, SheetRange, StaticToken, TokenFile, TokenProvider};
use std::sync::Arc;

/// Validated configuration, ready to build the processor from.
pub struct RuntimeConfig {
    pub config: AppConfig,
    pub profiles: ProfileTable,
    pub selection: ModelSelection,
    pub template: PromptTemplate,
    pub range: SheetRange,
    pub tokens: Arc<dyn TokenProvider>,
}

/// Run `load`, reporting a failure before the configured subscriber exists.
pub fn load_app_config<F>(load: F) -> AppResult<AppConfig>
where
    F: FnOnce() -> AppResult<AppConfig>,
{
    match load() {
        Ok(config) => Ok(config),
        Err(e) => {
            report_load_failure(&e);
            Err(e)
        }
    }
}

fn report_load_failure(err: &AppError) {
    match logging::init_logging(Some("info"), false, LogFormat::Pretty) {
        Ok(()) => tracing::error!("Failed to load configuration: {}", err),
        Err(_) => eprintln!("Failed to load configuration: {}", err),
    }
}

/// Validate `config` and resolve credentials through `lookup`.
pub fn load_config<F>(config: AppConfig, lookup: F) -> AppResult<RuntimeConfig>
where
    F: Fn(&str) -> Option<String>,
{
    config.validate()?;

    let profiles = ProfileTable::from_config(&config, lookup)?;
    let selection = select_model(&profiles, &config.provider, config.model.as_deref())?;
    let template = PromptTemplate::compile(&config.prompt.template)?;
    let range = SheetRange::parse(&config.sheet.range)?;
    let tokens = token_provider(&config.sheet)?;

    Ok(RuntimeConfig {
        config,
        profiles,
        selection,
        template,
        range,
        tokens,
    })
}

fn token_provider(sheet: &SheetConfig) -> AppResult<Arc<dyn TokenProvider>> {
    if let Some(token) = sheet.token.as_ref().filter(|t| !t.is_blank()) {
        return Ok(Arc::new(StaticToken::new(token.clone())));
    }

    match &sheet.token_file {
        Some(path) if path.is_file() => Ok(Arc::new(TokenFile::new(path.clone()))),
        Some(path) => Err(AppError::Config(format!(
            "Sheets token file {:?} not found. Complete the OAuth flow first or set POSTGEN_SHEETS_TOKEN",
            path
        ))),
        None => Err(AppError::Config(
            "No Sheets credential configured. Set POSTGEN_SHEETS_TOKEN or sheet.tokenFile"
                .to_string(),
        )),
    }
}

impl RuntimeConfig {
    /// Build the processor. Makes no network calls.
    pub fn build_processor(&self) -> AppResult<Processor> {
        let generator = create_generator(&self.config.provider, &self.profiles)?;

        let sheet = &self.config.sheet;
        let source = match &sheet.endpoint {
            Some(url) => GoogleSheetsSource::with_base_url(
                sheet.id.clone(),
                self.range.clone(),
                self.tokens.clone(),
                url,
            )?,
            None => {
                GoogleSheetsSource::new(sheet.id.clone(), self.range.clone(), self.tokens.clone())?
            }
        };

        Ok(Processor::new(
            Arc::new(source),
            generator,
            self.template.clone(),
            self.selection.clone(),
        )
        .with_system(self.config.prompt.system.clone())
        .with_timing(self.config.timing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postgen_core::Secret;
    use postgen_llm::ProviderType;
    use std::path::PathBuf;

    fn base_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.sheet.id = "sheet-1".to_string();
        config.sheet.token = Some(Secret::new("ya29.test"));
        config
    }

    fn keys(key: &str) -> Option<String> {
        match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "ANTHROPIC_API_KEY" => Some("ak-test".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_config_load_failure_is_reported_and_returned() {
        // The second pass hits an already installed subscriber.
        for _ in 0..2 {
            let result = load_app_config(|| {
                Err(AppError::Config("Unknown log format: xml".to_string()))
            });
            match result {
                Err(AppError::Config(msg)) => assert!(msg.contains("xml")),
                Err(other) => panic!("Expected config error, got {}", other),
                Ok(_) => panic!("Expected load failure to be returned"),
            }
        }
    }

    #[test]
    fn test_load_app_config_passes_config_through() {
        let config = load_app_config(|| Ok(base_config())).unwrap();
        assert_eq!(config.sheet.id, "sheet-1");
    }

    #[test]
    fn test_load_defaults() {
        let runtime = load_config(base_config(), keys).unwrap();

        assert_eq!(runtime.selection.provider, ProviderType::OpenAI);
        assert_eq!(runtime.selection.model, "gpt-4");
        assert_eq!(runtime.selection.settings.max_tokens, 3000);
        assert_eq!(runtime.range.anchor_row, 2);
    }

    #[test]
    fn test_explicit_model() {
        let mut config = base_config();
        config.provider = "anthropic".to_string();
        config.model = Some("claude-3-sonnet".to_string());

        let runtime = load_config(config, keys).unwrap();
        assert_eq!(runtime.selection.provider, ProviderType::Anthropic);
        assert_eq!(runtime.selection.settings.max_tokens, 3000);
    }

    #[test]
    fn test_startup_errors_are_config_errors() {
        let cases: [(&str, fn(&mut AppConfig)); 6] = [
            ("unknown provider", |c: &mut AppConfig| c.provider = "mistral".to_string()),
            ("unknown model", |c: &mut AppConfig| c.model = Some("gpt-5".to_string())),
            ("missing key", |c: &mut AppConfig| c.provider = "cohere".to_string()),
            ("missing sheet id", |c: &mut AppConfig| c.sheet.id.clear()),
            ("bad range", |c: &mut AppConfig| c.sheet.range = "A2:B".to_string()),
            ("template without topic", |c: &mut AppConfig| {
                c.prompt.template = "Write a post".to_string()
            }),
        ];

        for (name, mutate) in cases {
            let mut config = base_config();
            mutate(&mut config);
            assert!(
                matches!(load_config(config, keys), Err(AppError::Config(_))),
                "{} should be a config error",
                name
            );
        }
    }

    #[test]
    fn test_missing_token_file() {
        let mut config = base_config();
        config.sheet.token = None;
        config.sheet.token_file = Some(PathBuf::from("/nonexistent/postgen/token.json"));

        match load_config(config, keys) {
            Err(AppError::Config(msg)) => assert!(msg.contains("token file")),
            Err(other) => panic!("Expected config error, got {}", other),
            Ok(_) => panic!("Expected missing token file to fail"),
        }
    }

    #[test]
    fn test_existing_token_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = base_config();
        config.sheet.token = None;
        config.sheet.token_file = Some(file.path().to_path_buf());

        assert!(load_config(config, keys).is_ok());
    }

    #[test]
    fn test_build_processor_offline() {
        let mut config = base_config();
        config.sheet.endpoint = Some("http://127.0.0.1:9".to_string());

        let runtime = load_config(config, keys).unwrap();
        assert!(runtime.build_processor().is_ok());
    }
}
