use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use nr_agents::{AnalysisWorkflow, Stage};
use nr_core::{
    ArticleFetcher, ArticleMetadata, CompletionOptions, Error, InferenceModel, NewsSource, Result,
    Sentiment, Settings,
};
use nr_sources::ArticleCollector;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Analysis {
    Json,
    Fenced,
    Malformed,
    Fail,
}

#[derive(Debug)]
struct ScriptedModel {
    optimized: Option<&'static str>,
    analysis: Analysis,
    report_fails: bool,
    calls: Mutex<Vec<(String, CompletionOptions)>>,
}

impl ScriptedModel {
    fn new(optimized: Option<&'static str>, analysis: Analysis) -> Self {
        Self {
            optimized,
            analysis,
            report_fails: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_failing_report(mut self) -> Self {
        self.report_fails = true;
        self
    }

    fn calls_containing(&self, needle: &str) -> Vec<(String, CompletionOptions)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(prompt, _)| prompt.contains(needle))
            .cloned()
            .collect()
    }
}

const ANALYSIS_JSON: &str =
    r#"{"topic": "AI", "sentiment": "positive", "key_facts": ["models improve", "costs fall", "adoption grows"], "importance": 12}"#;

#[async_trait]
impl InferenceModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.calls.lock().unwrap().push((prompt.to_string(), *options));

        if prompt.contains("Optimized search query:") {
            return self
                .optimized
                .map(str::to_string)
                .ok_or_else(|| Error::Generation("optimizer offline".to_string()));
        }
        if prompt.contains("Answer in JSON format") {
            return match self.analysis {
                Analysis::Json => Ok(ANALYSIS_JSON.to_string()),
                Analysis::Fenced => Ok(format!("```json\n{}\n```", ANALYSIS_JSON)),
                Analysis::Malformed => Ok("I think this is about AI.".to_string()),
                Analysis::Fail => Err(Error::Generation("rate limited".to_string())),
            };
        }
        if self.report_fails {
            return Err(Error::Generation("context window exceeded".to_string()));
        }
        Ok("Final report: AI is moving fast.".to_string())
    }
}

struct StaticNews {
    count: usize,
    hang: bool,
    queries: Mutex<Vec<String>>,
}

impl StaticNews {
    fn new(count: usize) -> Self {
        Self {
            count,
            hang: false,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NewsSource for StaticNews {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_articles(&self, query: &str, page_size: usize) -> Result<Vec<ArticleMetadata>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok((0..self.count.min(page_size))
            .map(|i| ArticleMetadata {
                title: format!("AI story {}", i),
                url: format!("https://news.test/ai/{}", i),
                description: Some("Something about models.".to_string()),
                source_name: "Wire".to_string(),
                ..Default::default()
            })
            .collect())
    }
}

struct EchoFetcher;

#[async_trait]
impl ArticleFetcher for EchoFetcher {
    async fn fetch_full_text(&self, url: &str) -> Option<String> {
        Some(format!("Full text behind {}. Artificial intelligence keeps advancing.", url))
    }
}

fn workflow(model: Arc<ScriptedModel>, news: Arc<StaticNews>) -> AnalysisWorkflow {
    let settings = Settings::default();
    let collector = ArticleCollector::new(news, Arc::new(EchoFetcher), &settings);
    AnalysisWorkflow::new(model, collector, &settings)
}

#[tokio::test(start_paused = true)]
async fn test_artificial_intelligence_scenario() {
    let model = Arc::new(ScriptedModel::new(Some("\"artificial intelligence\""), Analysis::Json));
    let news = Arc::new(StaticNews::new(5));
    let workflow = workflow(model.clone(), news.clone());

    let (state, trace) = workflow.run_traced("artificial intelligence").await;

    assert_eq!(trace, vec![Stage::Research, Stage::Analysis, Stage::Summary]);
    assert_eq!(state.step_count, 3);
    assert!(!state.has_error());
    assert_eq!(state.articles.len(), 3);
    assert_eq!(state.analysis_records.len(), 3);
    assert_eq!(state.final_summary, "Final report: AI is moving fast.");

    for record in &state.analysis_records {
        assert!((1..=10).contains(&record.importance));
        assert_eq!(record.sentiment, Sentiment::Positive);
    }
    assert_eq!(state.analysis_records[0].article_title, "AI story 0");

    // quotes stripped from the optimized query
    assert_eq!(news.queries.lock().unwrap().as_slice(), ["artificial intelligence"]);

    let optimization = model.calls_containing("Optimized search query:");
    assert_eq!(optimization[0].1, CompletionOptions::new(0.1).with_max_tokens(50));
    let summary = model.calls_containing("Report should contain");
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].1.temperature, 0.2);
    assert!(summary[0].0.contains("\"article_title\": \"AI story 2\""));
}

#[tokio::test(start_paused = true)]
async fn test_zero_articles() {
    let model = Arc::new(ScriptedModel::new(Some("nothing"), Analysis::Json));
    let workflow = workflow(model.clone(), Arc::new(StaticNews::new(0)));

    let (state, trace) = workflow.run_traced("xyzzy").await;

    assert_eq!(trace, vec![Stage::Research, Stage::ErrorHandler]);
    assert_eq!(state.error_message.as_deref(), Some("No articles found"));
    assert!(state.final_summary.contains("No articles found"));
    assert_eq!(state.final_summary, "An error occurred: No articles found");
    assert_eq!(state.step_count, 1);
    assert!(model.calls_containing("Answer in JSON format").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_analysis_uses_fallback() {
    let model = Arc::new(ScriptedModel::new(Some("ai"), Analysis::Malformed));
    let workflow = workflow(model, Arc::new(StaticNews::new(2)));

    let state = workflow.run("ai").await;

    assert!(!state.has_error());
    assert_eq!(state.step_count, 3);
    assert_eq!(state.analysis_records.len(), 2);
    for record in &state.analysis_records {
        assert_eq!(record.importance, 5);
        assert_eq!(record.sentiment, Sentiment::Neutral);
        assert_eq!(record.key_facts, vec!["Could not analyze"]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_fenced_analysis_is_parsed() {
    let model = Arc::new(ScriptedModel::new(Some("ai"), Analysis::Fenced));
    let workflow = workflow(model, Arc::new(StaticNews::new(1)));

    let state = workflow.run("ai").await;
    assert_eq!(state.analysis_records[0].topic, "AI");
    assert_eq!(state.analysis_records[0].importance, 10);
}

#[tokio::test(start_paused = true)]
async fn test_generator_failure_in_analysis() {
    let model = Arc::new(ScriptedModel::new(Some("ai"), Analysis::Fail));
    let workflow = workflow(model, Arc::new(StaticNews::new(2)));

    let (state, trace) = workflow.run_traced("ai").await;

    assert_eq!(trace, vec![Stage::Research, Stage::Analysis, Stage::ErrorHandler]);
    assert_eq!(state.step_count, 2);
    let error = state.error_message.clone().unwrap();
    assert!(error.starts_with("Error in analysis stage:"));
    assert!(error.contains("rate limited"));
    assert_eq!(state.final_summary, format!("An error occurred: {}", error));
    // research results survive the failed stage
    assert_eq!(state.articles.len(), 2);
    assert!(state.analysis_records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_generator_failure_in_summary() {
    let model = Arc::new(ScriptedModel::new(Some("ai"), Analysis::Json).with_failing_report());
    let workflow = workflow(model.clone(), Arc::new(StaticNews::new(2)));

    let (state, trace) = workflow.run_traced("ai").await;

    assert_eq!(
        trace,
        vec![Stage::Research, Stage::Analysis, Stage::Summary, Stage::ErrorHandler]
    );
    assert_eq!(state.step_count, 3);
    let error = state.error_message.clone().unwrap();
    assert!(error.starts_with("Error in summary stage:"));
    assert!(error.contains("context window exceeded"));
    assert_eq!(state.final_summary, format!("An error occurred: {}", error));
    // earlier stages keep their results
    assert_eq!(state.articles.len(), 2);
    assert_eq!(state.analysis_records.len(), 2);
    assert_eq!(model.calls_containing("Report should contain").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_optimization_failure_uses_raw_query() {
    let model = Arc::new(ScriptedModel::new(None, Analysis::Json));
    let news = Arc::new(StaticNews::new(1));
    let workflow = workflow(model, news.clone());

    let state = workflow.run("What is going on with AI chips?").await;

    assert!(!state.has_error());
    assert_eq!(news.queries.lock().unwrap().as_slice(), ["What is going on with AI chips?"]);
}

#[tokio::test(start_paused = true)]
async fn test_without_query_optimization() {
    let model = Arc::new(ScriptedModel::new(Some("rewritten"), Analysis::Json));
    let news = Arc::new(StaticNews::new(1));
    let workflow = workflow(model.clone(), news.clone()).without_query_optimization();

    workflow.run("raw query").await;

    assert!(model.calls_containing("Optimized search query:").is_empty());
    assert_eq!(news.queries.lock().unwrap().as_slice(), ["raw query"]);
}

#[tokio::test(start_paused = true)]
async fn test_news_timeout_becomes_research_error() {
    let model = Arc::new(ScriptedModel::new(Some("ai"), Analysis::Json));
    let news = Arc::new(StaticNews {
        count: 3,
        hang: true,
        queries: Mutex::new(Vec::new()),
    });
    let workflow = workflow(model, news);

    let started = tokio::time::Instant::now();
    let state = workflow.run("ai").await;

    assert!(started.elapsed() >= Duration::from_secs(30));
    assert_eq!(state.step_count, 1);
    let error = state.error_message.unwrap();
    assert!(error.starts_with("Error in research stage: Timed out"));
}
