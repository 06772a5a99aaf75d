use std::net::SocketAddr;
use std::sync::Arc;
use clap::Parser;
use nr_agents::AnalysisWorkflow;
use nr_core::logging::init_logging;
use nr_core::{Error, Result, Settings};
use nr_inference::{create_embedder, create_model, ModelKind};
use nr_rag::{GraphBuildRequest, GraphRag, VectorRag};
use nr_sources::cli::{handle_command, SourceArgs};
use nr_sources::{ArticleCollector, HtmlArticleFetcher, NewsApiSource, SportsDbSource};
use nr_storage::{create_graph_store, create_vector_store, StorageKind, DEFAULT_NAMESPACE};
use nr_web::AppState;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "News and sports question answering over vector, graph and agent pipelines", long_about = None)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = ModelKind::Openai, global = true)]
    model: ModelKind,
    #[arg(long, value_enum, default_value_t = StorageKind::Memory, global = true)]
    storage: StorageKind,
    /// Overrides LOG_LEVEL (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Research, analyze and summarize the news for a query
    Analyze {
        query: String,
        /// Search with the query as typed instead of a rewritten one
        #[arg(long)]
        no_optimize: bool,
    },
    /// Index news articles and answer a question from the closest chunks
    Vector {
        question: String,
        /// News search used to build the index (repeatable)
        #[arg(short, long = "query", required = true)]
        queries: Vec<String>,
        #[arg(short, long, default_value_t = 3)]
        page_size: usize,
        /// Number of chunks to retrieve
        #[arg(short)]
        k: Option<usize>,
    },
    /// Build the team and news graph and answer a question from it
    Graph {
        question: String,
        /// League loaded into the knowledge graph (repeatable, default NBA and NHL)
        #[arg(long = "league")]
        leagues: Vec<String>,
        /// News search loaded into the lexical graph (repeatable)
        #[arg(long = "news-query")]
        news_queries: Vec<String>,
        #[arg(short, long, default_value_t = 10)]
        page_size: usize,
        /// Erase the graph before building
        #[arg(long)]
        start_clean: bool,
        /// Query the stored graph without loading anything
        #[arg(long)]
        no_build: bool,
        /// Maximum number of news items in the context
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete every node and edge of the stored graph
    GraphErase,
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Inspect the content providers
    Source(SourceArgs),
}

fn collector(settings: &Settings) -> Result<ArticleCollector> {
    Ok(ArticleCollector::new(
        Arc::new(NewsApiSource::from_settings(settings)?),
        Arc::new(HtmlArticleFetcher::from_settings(settings)?),
        settings,
    ))
}

fn graph_request(
    leagues: Vec<String>,
    news_queries: Vec<String>,
    page_size: usize,
    start_clean: bool,
) -> GraphBuildRequest {
    let mut request = GraphBuildRequest {
        page_size,
        start_clean,
        ..Default::default()
    };
    if !leagues.is_empty() {
        request.leagues = leagues;
    }
    if !news_queries.is_empty() {
        request.news_queries = news_queries;
    }
    request
}

fn bind_address(settings: &Settings, host: Option<String>, port: Option<u16>) -> Result<SocketAddr> {
    let host = host.unwrap_or_else(|| settings.api_host.clone());
    let port = port.unwrap_or(settings.api_port);
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("Invalid listen address {}:{}: {}", host, port, e)))
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    match cli.command {
        Commands::Analyze { query, no_optimize } => {
            let model = create_model(cli.model, &settings)?;
            let mut workflow = AnalysisWorkflow::new(model, collector(&settings)?, &settings);
            if no_optimize {
                workflow = workflow.without_query_optimization();
            }
            let state = workflow.run(&query).await;

            info!(
                "📰 {} articles found, {} analyzed in {} steps",
                state.articles.len(),
                state.analysis_records.len(),
                state.step_count
            );
            for record in &state.analysis_records {
                println!(
                    "- {} [{}] {} (importance {}/10)",
                    record.article_title, record.sentiment, record.topic, record.importance
                );
            }
            println!("\n{}", state.final_summary);
        }
        Commands::Vector { question, queries, page_size, k } => {
            let model = create_model(cli.model, &settings)?;
            let embedder = create_embedder(cli.model, &settings)?;
            let store = create_vector_store(cli.storage, &settings, embedder, DEFAULT_NAMESPACE).await?;
            let rag = VectorRag::new(model, store, &settings)?;

            let chunks = rag.fetch_and_build(&collector(&settings)?, &queries, page_size).await?;
            info!("📚 Indexed {} chunks", chunks);

            let answer = rag.query(&question, k).await?;
            println!("{}", answer.answer);
            for fragment in &answer.fragments {
                println!(
                    "  [{}] {:.3} {} ({})",
                    fragment.relevance_rank, fragment.score, fragment.source_title, fragment.source_url
                );
            }
        }
        Commands::Graph {
            question,
            leagues,
            news_queries,
            page_size,
            start_clean,
            no_build,
            limit,
        } => {
            let model = create_model(cli.model, &settings)?;
            let store = create_graph_store(cli.storage, &settings, DEFAULT_NAMESPACE).await?;
            let rag = GraphRag::new(model, store, &settings);

            if !no_build {
                let request = graph_request(leagues, news_queries, page_size, start_clean);
                let teams = SportsDbSource::from_settings(&settings)?;
                let report = rag.build(&request, &teams, &collector(&settings)?).await?;
                info!(
                    "🕸️ Graph holds {} nodes ({} teams, {} articles loaded)",
                    report.node_count, report.teams, report.articles
                );
            }

            println!("{}", rag.query(&question, limit).await?);
        }
        Commands::GraphErase => {
            let model = create_model(ModelKind::Dummy, &settings)?;
            let store = create_graph_store(cli.storage, &settings, DEFAULT_NAMESPACE).await?;
            GraphRag::new(model, store, &settings).erase_graph().await?;
            info!("🧹 Graph erased");
        }
        Commands::Serve { host, port } => {
            let addr = bind_address(&settings, host, port)?;
            let state = AppState::from_settings(settings, cli.model, cli.storage)?;
            nr_web::serve(state, addr).await?;
        }
        Commands::Source(args) => handle_command(args, &settings).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    init_logging(&settings.log_level);
    info!("⚙️ Using {:?} model and {:?} storage", cli.model, cli.storage);

    run(cli, settings).await
}
