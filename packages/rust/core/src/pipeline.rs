//! End-to-end modernization pipeline:
//! URL → fetch → analyze → research → generate → quality check.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use docmodernizer_fetcher::{FetchOptions, fetch_documentation};
use docmodernizer_llm::{AnthropicProvider, LlmProvider, OpenAiCompatProvider};
use docmodernizer_shared::{AppConfig, FetchErrorPolicy, PipelineState, StateUpdate};

use crate::stages::{self, Stage, StageResult};

// ---------------------------------------------------------------------------
// Config / progress
// ---------------------------------------------------------------------------

/// Orchestrator settings.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Options for the page fetch.
    pub fetch: FetchOptions,
    /// Behaviour after a failed fetch.
    pub on_fetch_error: FetchErrorPolicy,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            fetch: FetchOptions {
                timeout_secs: config.defaults.fetch_timeout_secs,
            },
            on_fetch_error: config.pipeline.on_fetch_error,
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when a stage starts.
    fn stage_started(&self, stage: Stage);
    /// Called when a stage has been merged into the state.
    fn stage_finished(&self, stage: Stage);
    /// Called once the pipeline stops, whether or not every stage ran.
    fn done(&self, state: &PipelineState);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage_started(&self, _stage: Stage) {}
    fn stage_finished(&self, _stage: Stage) {}
    fn done(&self, _state: &PipelineState) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The modernization pipeline and the two model providers it drives.
///
/// The analysis provider backs the analyzer and generator; the review
/// provider backs the researcher and quality checker. A missing provider
/// makes its stages fail, which the pipeline degrades to empty output.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    analysis: Option<Arc<dyn LlmProvider>>,
    review: Option<Arc<dyn LlmProvider>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            analysis: None,
            review: None,
        }
    }

    pub fn with_analysis_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.analysis = Some(provider);
        self
    }

    pub fn with_review_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.review = Some(provider);
        self
    }

    /// Build a pipeline with HTTP providers from the application config.
    ///
    /// A provider that cannot be constructed is logged and left unset.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let max_tokens = config.defaults.max_tokens;
        let mut pipeline = Self::new(PipelineConfig::from(config));

        match OpenAiCompatProvider::from_config(&config.analysis, max_tokens) {
            Ok(provider) => {
                log_provider("analysis", &provider);
                pipeline = pipeline.with_analysis_provider(Arc::new(provider));
            }
            Err(e) => error!(error = %e, "analysis provider unavailable"),
        }
        match AnthropicProvider::from_config(&config.review, max_tokens) {
            Ok(provider) => {
                log_provider("review", &provider);
                pipeline = pipeline.with_review_provider(Arc::new(provider));
            }
            Err(e) => error!(error = %e, "review provider unavailable"),
        }

        pipeline
    }

    /// Run every stage for `url` and return the final state.
    ///
    /// Never fails: a fetch failure is recorded in `state.error`, and LLM
    /// stage failures leave their fields at the default value.
    #[instrument(skip_all, fields(url = %url, run_id = tracing::field::Empty))]
    pub async fn run(&self, url: &str, progress: &dyn ProgressReporter) -> PipelineState {
        let start = Instant::now();
        let mut state = PipelineState::new(url);
        tracing::Span::current().record("run_id", tracing::field::display(state.run_id));

        info!("starting modernization pipeline");

        let mut stage = Some(Stage::Fetch);
        while let Some(current) = stage {
            progress.stage_started(current);
            let update = self.run_stage(current, &state).await;
            state.apply(update);
            progress.stage_finished(current);

            if current == Stage::Fetch
                && state.error.is_some()
                && self.config.on_fetch_error == FetchErrorPolicy::Halt
            {
                warn!("fetch failed, skipping remaining stages");
                break;
            }
            stage = current.next();
        }

        info!(
            issues = state.analyzed_sections.len(),
            research = state.research_results.len(),
            average_score = state.quality_report.average_score,
            failed = state.error.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pipeline finished"
        );

        progress.done(&state);
        state
    }

    async fn run_stage(&self, stage: Stage, state: &PipelineState) -> StateUpdate {
        let analysis = self.analysis.as_deref();
        let review = self.review.as_deref();

        match stage {
            Stage::Fetch => self.fetch(&state.url).await,
            Stage::Analyze => StateUpdate {
                analyzed_sections: Some(settle(
                    stage,
                    stages::analyze_content(analysis, &state.original_content).await,
                )),
                ..Default::default()
            },
            Stage::Research => StateUpdate {
                research_results: Some(settle(
                    stage,
                    stages::research_best_practices(review, &state.analyzed_sections).await,
                )),
                ..Default::default()
            },
            Stage::Generate => StateUpdate {
                modernized_markdown: Some(settle(
                    stage,
                    stages::generate_modernized_docs(
                        analysis,
                        &state.original_content,
                        &state.analyzed_sections,
                        &state.research_results,
                    )
                    .await,
                )),
                ..Default::default()
            },
            Stage::QualityCheck => StateUpdate {
                quality_report: Some(settle(
                    stage,
                    stages::check_quality(
                        review,
                        &state.original_content,
                        &state.modernized_markdown,
                    )
                    .await,
                )),
                ..Default::default()
            },
        }
    }

    async fn fetch(&self, url: &str) -> StateUpdate {
        match fetch_documentation(url, &self.config.fetch).await {
            Ok(doc) => StateUpdate {
                raw_html: Some(doc.raw_html),
                original_content: Some(doc.markdown),
                ..Default::default()
            },
            Err(e) => {
                if e.is_validation() {
                    warn!(url, error = %e, "rejected documentation URL");
                } else {
                    error!(url, error = %e, "failed to fetch documentation");
                }
                StateUpdate {
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        }
    }
}

fn log_provider(role: &str, provider: &dyn LlmProvider) {
    info!(
        role,
        provider = provider.provider_name(),
        model = provider.model_name(),
        "llm provider configured"
    );
}

/// Degrade a failed stage to its default output.
fn settle<T: Default>(stage: Stage, outcome: StageResult<T>) -> T {
    outcome.unwrap_or_else(|failure| {
        error!(stage = %stage, error = %failure, "stage failed, continuing with default output");
        T::default()
    })
}
