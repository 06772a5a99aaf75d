use std::sync::Arc;
use std::time::Duration;
use nr_core::logging::Logger;
use nr_core::timeout::with_timeout;
use nr_core::{CompletionOptions, Error, InferenceModel, Result, Settings, WorkflowState};
use nr_sources::ArticleCollector;
use crate::analysis::parse_analysis;
use crate::prompts;
use crate::stage::{next_stage, Stage};

const OPTIMIZATION_TEMPERATURE: f32 = 0.1;
const OPTIMIZATION_MAX_TOKENS: u32 = 50;
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Research, analysis and summary of the news for a query, run as an
/// explicit state machine over a [`WorkflowState`].
pub struct AnalysisWorkflow {
    model: Arc<dyn InferenceModel>,
    collector: ArticleCollector,
    page_size: usize,
    analysis_options: CompletionOptions,
    timeout: Duration,
    optimize_query: bool,
    logger: Logger,
}

impl AnalysisWorkflow {
    pub fn new(model: Arc<dyn InferenceModel>, collector: ArticleCollector, settings: &Settings) -> Self {
        Self {
            model,
            collector,
            page_size: settings.agent_page_size,
            analysis_options: CompletionOptions::new(settings.default_temperature),
            timeout: settings.request_timeout(),
            optimize_query: true,
            logger: Logger::new().with_prefix("[workflow]"),
        }
    }

    /// Search with the raw query instead of asking the model to rewrite it.
    pub fn without_query_optimization(mut self) -> Self {
        self.optimize_query = false;
        self
    }

    pub async fn run(&self, query: &str) -> WorkflowState {
        self.run_traced(query).await.0
    }

    /// Like [`run`](Self::run), also returning the stages in execution order.
    pub async fn run_traced(&self, query: &str) -> (WorkflowState, Vec<Stage>) {
        self.logger.info(&format!("Starting news analysis for query: '{}'", query));

        let mut state = WorkflowState::new(query);
        let mut trace = Vec::new();
        let mut stage = Stage::Research;

        loop {
            trace.push(stage);
            self.execute(stage, &mut state).await;
            stage = next_stage(stage, &state);
            if stage.is_terminal() {
                break;
            }
        }

        self.logger.info(&format!("News analysis completed after {} steps", state.step_count));
        (state, trace)
    }

    async fn execute(&self, stage: Stage, state: &mut WorkflowState) {
        let outcome = match stage {
            Stage::Research => self.research(state).await,
            Stage::Analysis => self.analysis(state).await,
            Stage::Summary => self.summary(state).await,
            Stage::ErrorHandler => return self.error_handler(state),
            Stage::End => return,
        };
        self.finish_stage(stage, state, outcome);
    }

    /// Bookkeeping after a research, analysis or summary stage: the step
    /// counter moves on every exit path and a failure becomes the error message.
    fn finish_stage(&self, stage: Stage, state: &mut WorkflowState, outcome: Result<()>) {
        state.step_count += 1;

        if let Err(e) = outcome {
            let message = match e {
                Error::NoArticlesFound | Error::NoArticlesToAnalyze | Error::NoAnalysisResults => e.to_string(),
                other => format!("Error in {} stage: {}", stage, other),
            };
            self.logger
                .clone()
                .with_prefix(format!("[{}]", stage))
                .error(&message);
            state.error_message = Some(message);
        }
    }

    fn error_handler(&self, state: &mut WorkflowState) {
        let message = state.error_message.clone().unwrap_or_else(|| "Unknown error".to_string());
        self.logger.error(&format!("Workflow error: {}", message));
        state.final_summary = format!("An error occurred: {}", message);
    }

    async fn optimized_query(&self, query: &str) -> Option<String> {
        let options = CompletionOptions::new(OPTIMIZATION_TEMPERATURE).with_max_tokens(OPTIMIZATION_MAX_TOKENS);
        let prompt = prompts::query_optimization(query);

        match with_timeout(self.timeout, "query optimization", self.model.complete(&prompt, &options)).await {
            Ok(raw) => {
                let optimized = raw.trim().trim_matches('"').trim_matches('\'').trim().to_string();
                if optimized.is_empty() {
                    None
                } else {
                    self.logger.info(&format!("Optimized query: '{}' -> '{}'", query, optimized));
                    Some(optimized)
                }
            }
            Err(e) => {
                self.logger.warn(&format!("Query optimization failed, using original: {}", e));
                None
            }
        }
    }

    async fn research(&self, state: &mut WorkflowState) -> Result<()> {
        let search_query = if self.optimize_query {
            self.optimized_query(&state.query).await
        } else {
            None
        }
        .unwrap_or_else(|| state.query.clone());

        let articles = self.collector.collect(&search_query, self.page_size).await?;
        if articles.is_empty() {
            return Err(Error::NoArticlesFound);
        }

        self.logger.info(&format!("Found {} articles", articles.len()));
        state.articles = articles;
        Ok(())
    }

    async fn analysis(&self, state: &mut WorkflowState) -> Result<()> {
        if state.articles.is_empty() {
            return Err(Error::NoArticlesToAnalyze);
        }

        let mut records = Vec::with_capacity(state.articles.len());
        for article in &state.articles {
            if article.extracted_text.trim().is_empty() {
                continue;
            }
            let raw = with_timeout(
                self.timeout,
                "article analysis",
                self.model.complete(&prompts::article_analysis(article), &self.analysis_options),
            )
            .await?;
            records.push(parse_analysis(&raw, &article.title, &article.source_name));
        }

        self.logger.info(&format!("Analyzed {} articles", records.len()));
        state.analysis_records = records;
        Ok(())
    }

    async fn summary(&self, state: &mut WorkflowState) -> Result<()> {
        if state.analysis_records.is_empty() {
            return Err(Error::NoAnalysisResults);
        }

        let analysis_json = serde_json::to_string_pretty(&state.analysis_records)?;
        let options = CompletionOptions::new(SUMMARY_TEMPERATURE);
        let report = with_timeout(
            self.timeout,
            "final report",
            self.model.complete(&prompts::final_report(&state.query, &analysis_json), &options),
        )
        .await?;

        self.logger.info("Final report created");
        state.final_summary = report;
        Ok(())
    }
}
