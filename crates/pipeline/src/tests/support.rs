//! Test doubles for the processing loop.

use crate::processor::Processor;
use crate::sleeper::Sleeper;
use postgen_core::config::LoopConfig;
use postgen_core::{AppError, AppResult, ProviderErrorKind};
use postgen_llm::{GenerationRequest, ModelSelection, ModelSettings, ProviderType, TextGenerator};
use postgen_prompt::PromptTemplate;
use postgen_sheets::{MemorySheet, RowId, Topic, TopicSource};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = dyn Fn(&GenerationRequest, usize) -> AppResult<String> + Send + Sync;

/// Generator answering through a closure and recording every request.
pub struct ScriptedGenerator {
    respond: Box<Responder>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&GenerationRequest, usize) -> AppResult<String> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers "Post: <prompt>" for every request.
    pub fn echo() -> Self {
        Self::new(|request, _| Ok(format!("Post: {}", request.prompt)))
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<String> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        (self.respond)(request, call)
    }
}

pub fn provider_error(kind: ProviderErrorKind) -> AppError {
    AppError::provider("scripted", kind, "scripted failure")
}

/// Sleeper that records durations instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Memory sheet with switchable failures.
pub struct FlakySheet {
    pub sheet: MemorySheet,
    fail_fetch: AtomicBool,
    panic_on_fetch: AtomicBool,
    failing_commits: Mutex<HashSet<u32>>,
}

impl FlakySheet {
    pub fn new(sheet: MemorySheet) -> Self {
        Self {
            sheet,
            fail_fetch: AtomicBool::new(false),
            panic_on_fetch: AtomicBool::new(false),
            failing_commits: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn panic_on_fetch(&self, panic: bool) {
        self.panic_on_fetch.store(panic, Ordering::SeqCst);
    }

    pub fn fail_commit(&self, row: u32) {
        self.failing_commits.lock().unwrap().insert(row);
    }
}

#[async_trait::async_trait]
impl TopicSource for FlakySheet {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn fetch_pending(&self) -> AppResult<Vec<Topic>> {
        if self.panic_on_fetch.load(Ordering::SeqCst) {
            panic!("sheet exploded");
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::Source("credential expired or invalid".to_string()));
        }
        self.sheet.fetch_pending().await
    }

    async fn commit(&self, row: RowId, content: &str) -> AppResult<()> {
        let rejected = self.failing_commits.lock().unwrap().contains(&row.0);
        if rejected {
            return Err(AppError::Source(format!("write to row {} rejected", row)));
        }
        self.sheet.commit(row, content).await
    }
}

pub fn selection() -> ModelSelection {
    ModelSelection {
        provider: ProviderType::OpenAI,
        model: "gpt-4".to_string(),
        settings: ModelSettings::new(3000, 0.7),
    }
}

pub fn timing() -> LoopConfig {
    LoopConfig {
        idle_interval_secs: 300,
        pacing_delay_secs: 2,
        error_backoff_secs: 60,
        rate_limit_retries: 3,
        rate_limit_backoff_secs: 2,
    }
}

/// Everything a scenario needs, wired together.
pub struct Harness {
    pub source: Arc<FlakySheet>,
    pub generator: Arc<ScriptedGenerator>,
    pub sleeper: Arc<RecordingSleeper>,
    pub processor: Processor,
}

impl Harness {
    pub fn new(rows: Vec<Vec<&str>>, generator: ScriptedGenerator) -> Self {
        let source = Arc::new(FlakySheet::new(MemorySheet::new(rows)));
        let generator = Arc::new(generator);
        let sleeper = Arc::new(RecordingSleeper::default());

        let processor = Processor::new(
            source.clone(),
            generator.clone(),
            PromptTemplate::compile("Topic: {topic}").unwrap(),
            selection(),
        )
        .with_timing(timing())
        .with_sleeper(sleeper.clone());

        Self {
            source,
            generator,
            sleeper,
            processor,
        }
    }

    pub fn configure(self, f: impl FnOnce(Processor) -> Processor) -> Self {
        Self {
            processor: f(self.processor),
            ..self
        }
    }

    pub async fn grid(&self) -> Vec<Vec<String>> {
        self.source.sheet.snapshot().await
    }
}
