pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod sources;
pub mod storage;
pub mod text;
pub mod timeout;
pub mod types;

pub use config::Settings;
pub use error::{Error, Result};
pub use models::{cosine_similarity, CompletionOptions, EmbeddingModel, InferenceModel};
pub use sources::{ArticleFetcher, NewsSource, TeamSource};
pub use storage::{GraphEdge, GraphNode, GraphQuery, GraphRow, GraphStore, NodeKey, VectorStore};
pub use types::{
    AnalysisRecord, Article, ArticleMetadata, Chunk, RetrievedFragment, Sentiment, Team,
    WorkflowState,
};
