use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use nr_core::{EmbeddingModel, GraphStore, InferenceModel, Result, Settings, TeamSource, VectorStore};
use nr_inference::{create_embedder, create_model, ModelKind};
use nr_rag::{GraphRag, VectorRag};
use nr_sources::{ArticleCollector, HtmlArticleFetcher, NewsApiSource, SportsDbSource};
use nr_storage::{create_graph_store, create_vector_store, StorageKind};

/// Built pipelines, one per build request, keyed by the id handed back to the client.
pub struct Sessions<T> {
    inner: RwLock<HashMap<Uuid, Arc<T>>>,
}

impl<T> Default for Sessions<T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Sessions<T> {
    pub async fn insert(&self, id: Uuid, pipeline: Arc<T>) {
        self.inner.write().await.insert(id, pipeline);
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<T>> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Arc<T>> {
        self.inner.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

pub struct AppState {
    pub settings: Settings,
    pub model: Arc<dyn InferenceModel>,
    pub embedder: Arc<dyn EmbeddingModel>,
    pub storage: StorageKind,
    pub collector: ArticleCollector,
    pub teams: Arc<dyn TeamSource>,
    pub vector_sessions: Sessions<VectorRag>,
    pub graph_sessions: Sessions<GraphRag>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        model: Arc<dyn InferenceModel>,
        embedder: Arc<dyn EmbeddingModel>,
        storage: StorageKind,
        collector: ArticleCollector,
        teams: Arc<dyn TeamSource>,
    ) -> Self {
        Self {
            settings,
            model,
            embedder,
            storage,
            collector,
            teams,
            vector_sessions: Sessions::default(),
            graph_sessions: Sessions::default(),
        }
    }

    /// Wires the real providers: NewsAPI, TheSportsDB and the HTML fetcher.
    pub fn from_settings(settings: Settings, model: ModelKind, storage: StorageKind) -> Result<Self> {
        let collector = ArticleCollector::new(
            Arc::new(NewsApiSource::from_settings(&settings)?),
            Arc::new(HtmlArticleFetcher::from_settings(&settings)?),
            &settings,
        );
        let teams = Arc::new(SportsDbSource::from_settings(&settings)?);
        Ok(Self::new(
            settings.clone(),
            create_model(model, &settings)?,
            create_embedder(model, &settings)?,
            storage,
            collector,
            teams,
        ))
    }

    /// Store for a new vector session; persistent backends give each session its own collection.
    pub async fn vector_store(&self, session: &Uuid) -> Result<Arc<dyn VectorStore>> {
        create_vector_store(self.storage, &self.settings, self.embedder.clone(), &session.to_string()).await
    }

    /// Store for a new graph session; rows in a shared database are tagged with the session id.
    pub async fn graph_store(&self, session: &Uuid) -> Result<Arc<dyn GraphStore>> {
        create_graph_store(self.storage, &self.settings, &session.to_string()).await
    }
}
