use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use nr_core::storage::{labels, props};
use nr_core::timeout::with_timeout;
use nr_core::{
    Article, CompletionOptions, Error, GraphEdge, GraphNode, GraphQuery, GraphRow, GraphStore,
    InferenceModel, NodeKey, Result, Settings, Team, TeamSource,
};
use nr_sources::ArticleCollector;
use crate::context::{ContextAssembler, ContextBlock};

const KEYWORD_TEMPERATURE: f32 = 0.1;

/// What to load into the graph in one go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphBuildRequest {
    pub leagues: Vec<String>,
    pub news_queries: Vec<String>,
    pub page_size: usize,
    pub start_clean: bool,
}

impl Default for GraphBuildRequest {
    fn default() -> Self {
        Self {
            leagues: vec!["NBA".to_string(), "NHL".to_string()],
            news_queries: vec!["NBA 2024-2025".to_string(), "NHL 2024-2025".to_string()],
            page_size: 10,
            start_clean: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphBuildReport {
    pub teams: usize,
    pub articles: usize,
    pub node_count: usize,
}

/// Retrieval over a property graph of teams (structured knowledge) and news
/// articles linked to their keywords (lexical graph).
pub struct GraphRag {
    model: Arc<dyn InferenceModel>,
    store: Arc<dyn GraphStore>,
    assembler: ContextAssembler,
    news_limit: usize,
    preview_chars: usize,
    keywords_per_article: usize,
    options: CompletionOptions,
    timeout: Duration,
    built: AtomicBool,
}

fn news_key(article: &Article) -> String {
    format!("{} <{}>", article.title, article.url)
}

impl GraphRag {
    pub fn new(model: Arc<dyn InferenceModel>, store: Arc<dyn GraphStore>, settings: &Settings) -> Self {
        Self {
            model,
            store,
            assembler: ContextAssembler::new(settings.max_fragment_chars),
            news_limit: settings.graph_news_limit,
            preview_chars: settings.graph_preview_chars,
            keywords_per_article: settings.keywords_per_article,
            options: CompletionOptions::new(settings.default_temperature).with_max_tokens(settings.max_tokens),
            timeout: settings.request_timeout(),
            built: AtomicBool::new(false),
        }
    }

    async fn upsert_node(&self, node: GraphNode) -> Result<()> {
        with_timeout(self.timeout, "graph write", self.store.upsert_node(node)).await
    }

    async fn upsert_edge(&self, edge: GraphEdge) -> Result<()> {
        with_timeout(self.timeout, "graph write", self.store.upsert_edge(edge)).await
    }

    async fn run(&self, query: &GraphQuery) -> Result<Vec<GraphRow>> {
        with_timeout(self.timeout, "graph query", self.store.run(query)).await
    }

    pub async fn node_count(&self) -> Result<usize> {
        with_timeout(self.timeout, "graph count", self.store.node_count()).await
    }

    /// Upserts one `Team` node per team. Running it again with the same teams
    /// leaves the node count unchanged.
    pub async fn build_knowledge_graph(&self, teams: &[Team]) -> Result<usize> {
        for team in teams {
            let node = GraphNode::new(labels::TEAM, team.id.clone())
                .with_property(props::NAME, Some(team.name.clone()))
                .with_property(props::LOCATION, team.location.clone())
                .with_property(props::VENUE, team.venue.clone())
                .with_property(props::LEAGUE, team.league.clone());
            self.upsert_node(node).await?;
        }
        self.built.store(true, Ordering::SeqCst);

        tracing::info!("Inserted {} teams into knowledge graph", teams.len());
        Ok(teams.len())
    }

    /// Upserts a `News` node per article and links it to the keywords the
    /// generator finds in its text.
    pub async fn build_lexical_graph(&self, articles: &[Article]) -> Result<usize> {
        for article in articles {
            let news = GraphNode::new(labels::NEWS, news_key(article))
                .with_property(props::TITLE, Some(article.title.clone()))
                .with_property(props::URL, Some(article.url.clone()))
                .with_property(props::TEXT, Some(article.extracted_text.clone()));
            let from = news.key.clone();
            self.upsert_node(news).await?;

            let keywords = self.extract_keywords(&article.extracted_text).await.unwrap_or_default();
            for keyword in keywords {
                let node = GraphNode::new(labels::KEYWORD, keyword.clone())
                    .with_property(props::NAME, Some(keyword.clone()));
                self.upsert_node(node).await?;
                self.upsert_edge(GraphEdge {
                    from: from.clone(),
                    relation: labels::MENTIONS.to_string(),
                    to: NodeKey::new(labels::KEYWORD, keyword),
                })
                .await?;
            }
        }
        self.built.store(true, Ordering::SeqCst);

        tracing::info!("Inserted {} news articles into lexical graph", articles.len());
        Ok(articles.len())
    }

    /// Asks the generator for up to `keywords_per_article` comma separated
    /// keywords. `None` when the call fails.
    pub async fn extract_keywords(&self, text: &str) -> Option<Vec<String>> {
        let prompt = format!(
            "Extract {} important keywords from this text. Answer with a comma separated list only.\n\n{}",
            self.keywords_per_article, text
        );
        let options = CompletionOptions::new(KEYWORD_TEMPERATURE);

        match with_timeout(self.timeout, "keyword extraction", self.model.complete(&prompt, &options)).await {
            Ok(raw) => Some(parse_keywords(&raw, self.keywords_per_article)),
            Err(e) => {
                tracing::warn!("Keyword extraction failed, continuing without keywords: {}", e);
                None
            }
        }
    }

    pub async fn query(&self, question: &str, limit: Option<usize>) -> Result<String> {
        if !self.built.load(Ordering::SeqCst) && self.node_count().await? == 0 {
            return Err(Error::NotInitialized("Knowledge graph".to_string()));
        }
        tracing::info!("Querying graph RAG: {}", question);

        let content = self
            .run(&GraphQuery::ContentWithKeywords {
                label: labels::NEWS.to_string(),
                relation: labels::MENTIONS.to_string(),
                limit: limit.unwrap_or(self.news_limit),
                preview_chars: self.preview_chars,
            })
            .await?;
        let pairs = self
            .run(&GraphQuery::SharedAttributePairs {
                label: labels::TEAM.to_string(),
                attribute: props::VENUE.to_string(),
            })
            .await?;

        let blocks: Vec<ContextBlock> = content.iter().chain(pairs.iter()).map(context_block).collect();
        let context = self.assembler.assemble(&blocks);

        let prompt = format!(
            "You can only use the following retrieved context to answer.\n\n\
             Context:\n{}\n\n\
             Question: {}\n\
             Answer:",
            context, question
        );
        let answer = with_timeout(self.timeout, "answer generation", self.model.complete(&prompt, &self.options)).await?;
        tracing::debug!("Generated answer: {}", nr_core::text::truncate_with_ellipsis(&answer, 100));
        Ok(answer)
    }

    pub async fn erase_graph(&self) -> Result<()> {
        with_timeout(self.timeout, "graph erase", self.store.erase_all()).await?;
        self.built.store(false, Ordering::SeqCst);
        tracing::info!("Graph erased");
        Ok(())
    }

    /// Loads teams for every league and news for every query, erasing the
    /// graph first when asked to.
    pub async fn build(
        &self,
        request: &GraphBuildRequest,
        teams: &dyn TeamSource,
        collector: &ArticleCollector,
    ) -> Result<GraphBuildReport> {
        if request.start_clean {
            self.erase_graph().await?;
        }

        let mut all_teams = Vec::new();
        for league in &request.leagues {
            let league_teams =
                with_timeout(self.timeout, "team fetch", async { Ok(teams.fetch_teams(league).await) }).await?;
            all_teams.extend(league_teams);
        }
        let team_count = self.build_knowledge_graph(&all_teams).await?;

        let articles = collector.collect_all(&request.news_queries, request.page_size).await?;
        let article_count = self.build_lexical_graph(&articles).await?;

        Ok(GraphBuildReport {
            teams: team_count,
            articles: article_count,
            node_count: self.node_count().await?,
        })
    }
}

fn parse_keywords(raw: &str, limit: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in raw.split([',', '\n']) {
        let keyword = strip_list_marker(keyword).to_lowercase();
        if !keyword.is_empty() && !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    keywords.truncate(limit);
    keywords
}

/// Drops a leading "- ", "* " or "1. " that models add when they answer with a list.
fn strip_list_marker(item: &str) -> &str {
    let item = item.trim();
    if let Some(rest) = item.strip_prefix(['-', '*']) {
        return rest.trim();
    }
    let unnumbered = item.trim_start_matches(|c: char| c.is_ascii_digit());
    if unnumbered.len() < item.len() {
        if let Some(rest) = unnumbered.strip_prefix(['.', ')']) {
            return rest.trim();
        }
    }
    item
}

fn context_block(row: &GraphRow) -> ContextBlock {
    match row {
        GraphRow::Content { title, url, preview, keywords } => ContextBlock::new(
            "News",
            format!(
                "{} ({})\nKeywords: {}\nText: {}",
                title,
                url,
                keywords.join(", "),
                preview
            ),
        ),
        GraphRow::Pair { left, right, shared } => ContextBlock::new(
            "Shared venue",
            format!("Team1: {}, Team2: {}, Venue: {}", left, right, shared),
        ),
    }
}
