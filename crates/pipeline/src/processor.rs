//! Topic processor: one fetch, generate, commit cycle at a time.
//!
//! ```text
//! Fetching ──(none)──────────────────────────▶ Waiting(idle) ──▶ Fetching
//!    │
//!    ├──(topics)──▶ Topic ─pace─▶ Topic ... ──▶ Waiting(idle) ──▶ Fetching
//!    │
//!    └──(error)─────────────────────────────▶ Waiting(backoff) ─▶ Fetching
//! ```
//!
//! Each topic is generated and committed before the next one starts. An
//! interrupted topic is left pending in the sheet and picked up again on a
//! later cycle.

use crate::sleeper::{Sleeper, TokioSleeper};
use futures::FutureExt;
use postgen_core::config::LoopConfig;
use postgen_core::{AppError, AppResult, ProviderErrorKind};
use postgen_llm::{GenerationRequest, ModelSelection, TextGenerator};
use postgen_prompt::PromptTemplate;
use postgen_sheets::{Topic, TopicSource};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, Instrument};

/// What happened to a single topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicOutcome {
    Committed,
    GenerationFailed,
    CommitFailed,
}

/// Per-cycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub committed: usize,
    pub generation_failed: usize,
    pub commit_failed: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: TopicOutcome) {
        match outcome {
            TopicOutcome::Committed => self.committed += 1,
            TopicOutcome::GenerationFailed => self.generation_failed += 1,
            TopicOutcome::CommitFailed => self.commit_failed += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.committed + self.generation_failed + self.commit_failed
    }
}

/// Result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No pending topics
    Idle,
    /// A batch was processed; individual topics may still have failed
    Processed(CycleReport),
    /// The cycle itself failed (fetch error or panic)
    Failed(String),
}

/// Drives topics from a source through a text generator.
pub struct Processor {
    source: Arc<dyn TopicSource>,
    generator: Arc<dyn TextGenerator>,
    template: PromptTemplate,
    selection: ModelSelection,
    system: Option<String>,
    timing: LoopConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl Processor {
    pub fn new(
        source: Arc<dyn TopicSource>,
        generator: Arc<dyn TextGenerator>,
        template: PromptTemplate,
        selection: ModelSelection,
    ) -> Self {
        Self {
            source,
            generator,
            template,
            selection,
            system: None,
            timing: LoopConfig::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// System prompt sent with every request.
    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_timing(mut self, timing: LoopConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run cycles until the process is stopped.
    pub async fn run(&self) {
        tracing::info!(
            source = self.source.name(),
            provider = self.generator.provider_name(),
            model = %self.selection.model,
            "Processing loop started"
        );

        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            self.step()
                .instrument(tracing::info_span!("cycle", number = cycle))
                .await;
        }
    }

    /// Run one cycle, then wait as long as its outcome requires.
    ///
    /// A panic inside the cycle is reported as [`CycleOutcome::Failed`].
    pub async fn step(&self) -> CycleOutcome {
        let outcome = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(panic = %message, "Cycle panicked");
                CycleOutcome::Failed(format!("cycle panicked: {}", message))
            }
        };

        let wait = self.wait_after(&outcome);
        tracing::debug!(wait_secs = wait.as_secs(), "Waiting before next cycle");
        self.sleeper.sleep(wait).await;

        outcome
    }

    /// How long to wait after a cycle ended with `outcome`.
    pub fn wait_after(&self, outcome: &CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Idle | CycleOutcome::Processed(_) => self.timing.idle_interval(),
            CycleOutcome::Failed(_) => self.timing.error_backoff(),
        }
    }

    /// Fetch pending topics and process them in row order.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let topics = match self.source.fetch_pending().await {
            Ok(topics) => topics,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch pending topics");
                return CycleOutcome::Failed(e.to_string());
            }
        };

        if topics.is_empty() {
            tracing::info!("No pending topics");
            return CycleOutcome::Idle;
        }

        tracing::info!(count = topics.len(), "Processing pending topics");

        let mut report = CycleReport::default();
        let mut topics = topics.iter().peekable();
        while let Some(topic) = topics.next() {
            report.record(self.process_topic(topic).await);

            if topics.peek().is_some() {
                self.sleeper.sleep(self.timing.pacing_delay()).await;
            }
        }

        tracing::info!(
            attempted = report.attempted(),
            committed = report.committed,
            generation_failed = report.generation_failed,
            commit_failed = report.commit_failed,
            "Cycle complete"
        );
        CycleOutcome::Processed(report)
    }

    /// Generate and commit one topic. Failures are logged, never raised.
    #[instrument(skip(self, topic), fields(row = topic.row.0, topic = %topic.text))]
    pub async fn process_topic(&self, topic: &Topic) -> TopicOutcome {
        let content = match self.generate(topic).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "Generation failed; topic stays pending");
                return TopicOutcome::GenerationFailed;
            }
        };

        match self.source.commit(topic.row, &content).await {
            Ok(()) => {
                tracing::info!(content_len = content.len(), "Committed generated post");
                TopicOutcome::Committed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Commit failed; topic stays pending");
                TopicOutcome::CommitFailed
            }
        }
    }

    /// Render the prompt and call the generator, retrying rate limits.
    async fn generate(&self, topic: &Topic) -> AppResult<String> {
        let prompt = self.template.render(&topic.text)?;
        let mut request = GenerationRequest::for_selection(prompt, &self.selection);
        if let Some(system) = &self.system {
            request = request.with_system(system.clone());
        }

        let mut attempt: u32 = 0;
        loop {
            match self.generator.generate(&request).await {
                Ok(text) if text.trim().is_empty() => {
                    return Err(AppError::provider(
                        self.generator.provider_name(),
                        ProviderErrorKind::EmptyResponse,
                        "Generated text is empty",
                    ));
                }
                Ok(text) => return Ok(text.trim().to_string()),
                Err(e) if e.is_rate_limited() && attempt < self.timing.rate_limit_retries => {
                    let backoff = self
                        .timing
                        .rate_limit_backoff()
                        .saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    tracing::warn!(
                        "Rate limited (attempt {}/{}), retrying in {}s",
                        attempt,
                        self.timing.rate_limit_retries,
                        backoff.as_secs()
                    );
                    self.sleeper.sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
