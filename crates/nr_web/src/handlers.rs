use std::sync::Arc;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use nr_agents::AnalysisWorkflow;
use nr_core::text::truncate_with_ellipsis;
use nr_core::AnalysisRecord;
use nr_rag::vector::{MAX_K, MIN_K};
use nr_rag::{GraphBuildRequest, GraphRag, VectorRag};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const MAX_PAGE_SIZE: usize = 20;
const SNIPPET_CHARS: usize = 300;

fn default_vector_page_size() -> usize {
    3
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub session_id: Uuid,
    pub question: String,
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BuildVectorRequest {
    pub queries: Vec<String>,
    #[serde(default = "default_vector_page_size")]
    pub page_size: usize,
}

/// Graph build body. Without `session_id` a fresh graph session is created;
/// with one, the build adds to that session's graph.
#[derive(Debug, Deserialize)]
pub struct BuildGraphRequest {
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub request: GraphBuildRequest,
}

#[derive(Debug, Deserialize)]
pub struct NewsAnalysisRequest {
    pub query: String,
    #[serde(default = "default_true")]
    pub optimize_query: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    pub vector_sessions: usize,
    pub graph_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub session_id: Uuid,
    pub status: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, Serialize)]
pub struct RetrievedDocument {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct RagResponse {
    pub session_id: Uuid,
    pub question: String,
    pub answer: String,
    pub context_used: Option<String>,
    pub documents: Vec<RetrievedDocument>,
}

#[derive(Debug, Serialize)]
pub struct NewsAnalysisResponse {
    pub query: String,
    pub articles_found: usize,
    pub articles_analyzed: usize,
    pub analysis_results: Vec<AnalysisRecord>,
    pub final_summary: String,
    pub error: Option<String>,
    pub step_count: u32,
}

fn require_text<'a>(value: &'a str, field: &str) -> ApiResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(value)
}

fn check_k(k: Option<usize>) -> ApiResult<Option<usize>> {
    match k {
        Some(k) if !(MIN_K..=MAX_K).contains(&k) => Err(ApiError::BadRequest(format!(
            "k must be between {} and {}, got {}",
            MIN_K, MAX_K, k
        ))),
        k => Ok(k),
    }
}

fn check_page_size(page_size: usize) -> ApiResult<usize> {
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::BadRequest(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }
    Ok(page_size)
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn unknown_session(kind: &str, id: &Uuid) -> ApiError {
    ApiError::NotFound(format!("Unknown {} session {}", kind, id))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model: state.model.name().to_string(),
        vector_sessions: state.vector_sessions.len().await,
        graph_sessions: state.graph_sessions.len().await,
    })
}

pub async fn build_vector(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BuildVectorRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let queries = non_blank(&body.queries);
    if queries.is_empty() {
        return Err(ApiError::BadRequest("queries must contain at least one query".to_string()));
    }
    let page_size = check_page_size(body.page_size)?;
    tracing::info!("📚 Building vector index for queries: {:?}", queries);

    let session_id = Uuid::new_v4();
    let rag = VectorRag::new(state.model.clone(), state.vector_store(&session_id).await?, &state.settings)?;
    let chunks = rag.fetch_and_build(&state.collector, &queries, page_size).await?;
    state.vector_sessions.insert(session_id, Arc::new(rag)).await;

    Ok(Json(StatusResponse {
        session_id,
        status: "success",
        message: "Vector database built successfully".to_string(),
        details: json!({ "queries": queries, "page_size": page_size, "chunks": chunks }),
    }))
}

pub async fn query_vector(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryRequest>,
) -> ApiResult<Json<RagResponse>> {
    let question = require_text(&body.question, "question")?;
    let k = check_k(body.k)?;
    let rag = state
        .vector_sessions
        .get(&body.session_id)
        .await
        .ok_or_else(|| unknown_session("vector", &body.session_id))?;

    let answer = rag.query(question, k).await?;
    let documents = answer
        .fragments
        .iter()
        .map(|f| RetrievedDocument {
            title: f.source_title.clone(),
            url: f.source_url.clone(),
            snippet: truncate_with_ellipsis(&f.text_snippet, SNIPPET_CHARS),
            score: f.score,
        })
        .collect();

    Ok(Json(RagResponse {
        session_id: body.session_id,
        question: question.to_string(),
        answer: answer.answer,
        context_used: Some(answer.context),
        documents,
    }))
}

pub async fn build_graph(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BuildGraphRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let mut request = body.request;
    request.page_size = check_page_size(request.page_size)?;
    request.leagues = non_blank(&request.leagues);
    request.news_queries = non_blank(&request.news_queries);

    let (session_id, rag, is_new) = match body.session_id {
        Some(id) => {
            let rag = state
                .graph_sessions
                .get(&id)
                .await
                .ok_or_else(|| unknown_session("graph", &id))?;
            (id, rag, false)
        }
        None => {
            let id = Uuid::new_v4();
            let store = state.graph_store(&id).await?;
            (id, Arc::new(GraphRag::new(state.model.clone(), store, &state.settings)), true)
        }
    };

    let report = rag.build(&request, state.teams.as_ref(), &state.collector).await?;
    if is_new {
        state.graph_sessions.insert(session_id, rag).await;
    }
    tracing::info!("🕸️ Graph session {} holds {} nodes", session_id, report.node_count);

    Ok(Json(StatusResponse {
        session_id,
        status: "success",
        message: "Graph database built successfully".to_string(),
        details: json!({
            "leagues": request.leagues,
            "news_queries": request.news_queries,
            "start_clean": request.start_clean,
            "teams": report.teams,
            "articles": report.articles,
            "node_count": report.node_count,
        }),
    }))
}

pub async fn query_graph(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryRequest>,
) -> ApiResult<Json<RagResponse>> {
    let question = require_text(&body.question, "question")?;
    let limit = check_k(body.k)?;
    let rag = state
        .graph_sessions
        .get(&body.session_id)
        .await
        .ok_or_else(|| unknown_session("graph", &body.session_id))?;

    let answer = rag.query(question, limit).await?;

    Ok(Json(RagResponse {
        session_id: body.session_id,
        question: question.to_string(),
        answer,
        context_used: None,
        documents: Vec::new(),
    }))
}

pub async fn erase_graph(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    let rag = state
        .graph_sessions
        .remove(&id)
        .await
        .ok_or_else(|| unknown_session("graph", &id))?;
    rag.erase_graph().await?;

    Ok(Json(StatusResponse {
        session_id: id,
        status: "success",
        message: "Graph erased".to_string(),
        details: Value::Null,
    }))
}

pub async fn news_analysis(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewsAnalysisRequest>,
) -> ApiResult<Json<NewsAnalysisResponse>> {
    let query = require_text(&body.query, "query")?;
    tracing::info!("🧭 Starting news analysis for: {}", query);

    let mut workflow = AnalysisWorkflow::new(state.model.clone(), state.collector.clone(), &state.settings);
    if !body.optimize_query {
        workflow = workflow.without_query_optimization();
    }
    let result = workflow.run(query).await;

    Ok(Json(NewsAnalysisResponse {
        query: result.query,
        articles_found: result.articles.len(),
        articles_analyzed: result.analysis_records.len(),
        analysis_results: result.analysis_records,
        final_summary: result.final_summary,
        error: result.error_message,
        step_count: result.step_count,
    }))
}
