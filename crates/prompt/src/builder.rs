//! Prompt builder for rendering the topic into a compiled template.

use handlebars::Handlebars;
use postgen_core::config::TOPIC_PLACEHOLDER;
use postgen_core::{AppError, AppResult};

const TEMPLATE_NAME: &str = "prompt";
const HANDLEBARS_PLACEHOLDER: &str = "{{topic}}";

/// A compiled prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Compile a template source.
    ///
    /// Fails with `AppError::Config` when the template does not parse,
    /// references a variable other than `topic`, or never uses the topic.
    ///
    /// # Example
    /// ```
    /// use postgen_prompt::PromptTemplate;
    ///
    /// let template = PromptTemplate::compile("Topic: {topic}").unwrap();
    /// assert_eq!(template.render("Rust ownership").unwrap(), "Topic: Rust ownership");
    /// ```
    pub fn compile(source: &str) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Plain text output, no HTML escaping
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        registry
            .register_template_string(TEMPLATE_NAME, normalize_placeholders(source))
            .map_err(|e| AppError::Config(format!("Failed to compile prompt template: {}", e)))?;

        let template = Self { registry };
        template.probe()?;

        tracing::debug!(template_len = source.len(), "Compiled prompt template");
        Ok(template)
    }

    /// Substitute `topic` into the template.
    pub fn render(&self, topic: &str) -> AppResult<String> {
        self.registry
            .render(TEMPLATE_NAME, &serde_json::json!({ "topic": topic }))
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
    }

    /// Render once with a sentinel to prove the topic lands in the output.
    fn probe(&self) -> AppResult<()> {
        const SENTINEL: &str = "\u{0}postgen-topic\u{0}";

        let rendered = self
            .render(SENTINEL)
            .map_err(|e| AppError::Config(format!("Invalid prompt template: {}", e)))?;

        if !rendered.contains(SENTINEL) {
            return Err(AppError::Config(format!(
                "Prompt template never uses the topic. Add {} where the topic belongs",
                TOPIC_PLACEHOLDER
            )));
        }
        Ok(())
    }
}

/// Rewrite single-brace `{topic}` placeholders to Handlebars syntax.
///
/// Already-doubled `{{topic}}` (and triple `{{{topic}}}`) are left alone.
fn normalize_placeholders(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 8);
    let mut rest = source;

    while let Some(idx) = rest.find(TOPIC_PLACEHOLDER) {
        let before = &rest[..idx];
        let after = &rest[idx + TOPIC_PLACEHOLDER.len()..];

        out.push_str(before);
        if before.ends_with('{') && after.starts_with('}') {
            out.push_str(TOPIC_PLACEHOLDER);
        } else {
            out.push_str(HANDLEBARS_PLACEHOLDER);
        }
        rest = after;
    }

    out.push_str(rest);
    out
}
