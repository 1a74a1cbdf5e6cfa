//! Postgen
//!
//! Polls a spreadsheet for topics, generates a post for each one with the
//! configured LLM provider and writes the post back next to its topic.
//! Configuration comes from `postgen.yaml` and the environment; there are
//! no command-line flags.

mod runtime;

use postgen_core::{config::AppConfig, logging, AppResult};

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = runtime::load_app_config(AppConfig::load)?;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)?;

    tracing::info!("Postgen starting");
    tracing::debug!("Config file: {:?}", config.config_file);

    let runtime = match runtime::load_config(config, |key| std::env::var(key).ok()) {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            return Err(e);
        }
    };

    tracing::info!(
        provider = runtime.selection.provider.as_str(),
        model = %runtime.selection.model,
        sheet = %runtime.config.sheet.id,
        range = %runtime.range,
        "Configuration loaded"
    );

    let processor = runtime.build_processor()?;

    tokio::select! {
        _ = processor.run() => {}
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => tracing::info!("Interrupted; pending topics stay pending"),
                Err(e) => {
                    tracing::warn!("Cannot listen for Ctrl-C ({}); running until killed", e);
                    processor.run().await;
                }
            }
        }
    }

    tracing::info!("Postgen stopped");
    Ok(())
}
