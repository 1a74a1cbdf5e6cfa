//! LLM integration crate for Postgen.
//!
//! This crate provides a provider-agnostic abstraction for generating text
//! with hosted Large Language Models. Every vendor implements the single
//! [`TextGenerator`] contract; callers pick one through [`create_generator`].
//!
//! # Providers
//! - **OpenAI**: chat completions
//! - **Anthropic**: messages API
//! - **Google**: Gemini `generateContent`
//! - **Cohere**: `generate`
//!
//! # Example
//! ```no_run
//! use postgen_llm::{create_generator, select_model, GenerationRequest, ProfileTable};
//!
//! # async fn example(table: ProfileTable) -> Result<(), Box<dyn std::error::Error>> {
//! let selection = select_model(&table, "openai", None)?;
//! let generator = create_generator("openai", &table)?;
//! let request = GenerationRequest::for_selection("Write about Rust", &selection);
//! let text = generator.generate(&request).await?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod profile;
pub mod providers;

// Re-export main types
pub use client::{GenerationRequest, TextGenerator};
pub use factory::create_generator;
pub use profile::{
    select_model, ModelSelection, ModelSettings, ProfileTable, ProviderProfile, ProviderType,
};
pub use providers::{AnthropicClient, CohereClient, GoogleClient, OpenAiClient};
