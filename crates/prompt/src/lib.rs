//! Prompt templating for Postgen.
//!
//! A prompt template is a piece of text with one substitution point for the
//! topic. Templates are compiled once at startup with Handlebars and then
//! rendered per topic:
//! - `{topic}` and `{{topic}}` are both accepted as the placeholder
//! - topic text is data, never template syntax
//! - templates referencing anything but the topic are rejected

pub mod builder;

// Re-export main types
pub use builder::PromptTemplate;
