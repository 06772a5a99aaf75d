use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use serde::Serialize;
use nr_core::timeout::with_timeout;
use nr_core::{
    Article, CompletionOptions, Error, InferenceModel, Result, RetrievedFragment, Settings,
    VectorStore,
};
use nr_sources::ArticleCollector;
use crate::chunker::TextChunker;
use crate::context::{ContextAssembler, ContextBlock};

pub const MIN_K: usize = 1;
pub const MAX_K: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct VectorAnswer {
    pub answer: String,
    pub fragments: Vec<RetrievedFragment>,
    pub context: String,
}

/// Retrieval over chunk embeddings: build an index from articles, then
/// answer questions from the nearest chunks.
pub struct VectorRag {
    model: Arc<dyn InferenceModel>,
    store: Arc<dyn VectorStore>,
    chunker: TextChunker,
    assembler: ContextAssembler,
    top_k: usize,
    options: CompletionOptions,
    timeout: Duration,
    built: AtomicBool,
}

impl VectorRag {
    pub fn new(model: Arc<dyn InferenceModel>, store: Arc<dyn VectorStore>, settings: &Settings) -> Result<Self> {
        Ok(Self {
            model,
            store,
            chunker: TextChunker::new(settings.chunk_size, settings.chunk_overlap)?,
            assembler: ContextAssembler::new(settings.max_fragment_chars),
            top_k: settings.top_k_results,
            options: CompletionOptions::new(settings.default_temperature).with_max_tokens(settings.max_tokens),
            timeout: settings.request_timeout(),
            built: AtomicBool::new(false),
        })
    }

    pub fn is_built(&self) -> bool {
        self.built.load(Ordering::SeqCst)
    }

    /// Chunks and indexes `articles`, returning the number of chunks stored.
    pub async fn build_index(&self, articles: &[Article]) -> Result<usize> {
        tracing::info!("Building vector index from {} articles", articles.len());

        let chunks: Vec<_> = articles
            .iter()
            .flat_map(|article| self.chunker.chunk_article(article))
            .collect();

        if !chunks.is_empty() {
            with_timeout(self.timeout, "vector indexing", self.store.index(&chunks)).await?;
        }
        self.built.store(true, Ordering::SeqCst);

        tracing::info!("Created {} document chunks", chunks.len());
        Ok(chunks.len())
    }

    /// Collects articles for every query and indexes them.
    pub async fn fetch_and_build(
        &self,
        collector: &ArticleCollector,
        queries: &[String],
        page_size: usize,
    ) -> Result<usize> {
        let articles = collector.collect_all(queries, page_size).await?;
        tracing::info!("Fetched total {} articles", articles.len());
        self.build_index(&articles).await
    }

    pub async fn query(&self, question: &str, k: Option<usize>) -> Result<VectorAnswer> {
        if !self.is_built() {
            return Err(Error::NotInitialized("Vector index".to_string()));
        }
        let k = k.unwrap_or(self.top_k).clamp(MIN_K, MAX_K);
        tracing::info!("Querying vector index (k={}): {}", k, question);

        let fragments = with_timeout(self.timeout, "vector search", self.store.search(question, k)).await?;
        let blocks: Vec<ContextBlock> = fragments.iter().map(ContextBlock::from).collect();
        let context = self.assembler.assemble(&blocks);

        let answer = with_timeout(
            self.timeout,
            "answer generation",
            self.model.complete(&answer_prompt(&context, question), &self.options),
        )
        .await?;

        Ok(VectorAnswer {
            answer,
            fragments,
            context,
        })
    }
}

fn answer_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant.\n\
         Answer the question *only* using the context below.\n\
         If the context does not provide an answer, say \"I don't know\".\n\n\
         Context:\n{}\n\n\
         Question: {}\n\
         Answer:",
        context, question
    )
}
