use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use qdrant_client::{
    qdrant::{
        vectors_config::Config, CountPoints, CreateCollection, Distance, PointStruct,
        SearchPoints, UpsertPoints, VectorParams, Vectors, VectorsConfig, WithPayloadSelector,
    },
    Qdrant,
};
use uuid::Uuid;
use nr_core::{Chunk, EmbeddingModel, Result, RetrievedFragment, Settings, VectorStore};

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
}

impl QdrantConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            url: settings.qdrant_url.clone(),
            collection: settings.qdrant_collection.clone(),
        }
    }

    /// Points the config at the collection owned by `namespace`. The default
    /// namespace keeps the configured collection name.
    pub fn for_namespace(mut self, namespace: &str) -> Self {
        if namespace != crate::DEFAULT_NAMESPACE {
            self.collection = format!("{}_{}", self.collection, namespace);
        }
        self
    }
}

fn external(e: impl Into<anyhow::Error>) -> nr_core::Error {
    nr_core::Error::External(e.into())
}

/// Chunks stored as points in a Qdrant collection, cosine distance.
pub struct QdrantVectorStore {
    client: Arc<Qdrant>,
    collection: String,
    embedder: Arc<dyn EmbeddingModel>,
}

impl QdrantVectorStore {
    pub async fn new(config: QdrantConfig, embedder: Arc<dyn EmbeddingModel>) -> Result<Self> {
        let client = Qdrant::from_url(&config.url).build().map_err(external)?;
        let client = Arc::new(client);

        let collections = client.list_collections().await.map_err(external)?;
        if !collections.collections.iter().any(|c| c.name == config.collection) {
            tracing::info!("Creating Qdrant collection '{}'", config.collection);
            let vectors_config = VectorsConfig {
                config: Some(Config::Params(VectorParams {
                    size: embedder.dimensions() as u64,
                    distance: Distance::Cosine.into(),
                    ..Default::default()
                })),
            };
            client
                .create_collection(CreateCollection {
                    collection_name: config.collection.clone(),
                    vectors_config: Some(vectors_config),
                    ..Default::default()
                })
                .await
                .map_err(external)?;
        }

        Ok(Self {
            client,
            collection: config.collection,
            embedder,
        })
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn index(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut points = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = self.embedder.generate_embeddings(&chunk.text).await?;
            let mut payload = HashMap::new();
            payload.insert("title".to_string(), chunk.title.clone().into());
            payload.insert("url".to_string(), chunk.url.clone().into());
            payload.insert("text".to_string(), chunk.text.clone().into());
            payload.insert("ordinal".to_string(), (chunk.ordinal as i64).into());

            points.push(PointStruct {
                id: Some(Uuid::new_v4().to_string().into()),
                vectors: Some(Vectors::from(embedding)),
                payload,
            });
        }

        self.client
            .upsert_points(UpsertPoints {
                collection_name: self.collection.clone(),
                points,
                ..Default::default()
            })
            .await
            .map_err(external)?;
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedFragment>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.generate_embeddings(query).await?;

        let results = self
            .client
            .search_points(SearchPoints {
                collection_name: self.collection.clone(),
                vector: embedding,
                limit: k as u64,
                with_payload: Some(WithPayloadSelector::from(true)),
                ..Default::default()
            })
            .await
            .map_err(external)?;

        let text = |payload: &HashMap<String, qdrant_client::qdrant::Value>, name: &str| {
            payload
                .get(name)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_default()
        };

        Ok(results
            .result
            .into_iter()
            .enumerate()
            .map(|(idx, point)| RetrievedFragment {
                source_title: text(&point.payload, "title"),
                source_url: text(&point.payload, "url"),
                text_snippet: text(&point.payload, "text"),
                relevance_rank: idx + 1,
                score: point.score,
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        let response = self
            .client
            .count(CountPoints {
                collection_name: self.collection.clone(),
                exact: Some(true),
                ..Default::default()
            })
            .await
            .map_err(external)?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = Settings {
            qdrant_url: "http://qdrant:6334".to_string(),
            ..Default::default()
        };
        let config = QdrantConfig::from_settings(&settings);
        assert_eq!(config.url, "http://qdrant:6334");
        assert_eq!(config.collection, "news_chunks");
    }

    #[test]
    fn test_namespaced_collections() {
        let settings = Settings::default();
        let config = QdrantConfig::from_settings(&settings);
        assert_eq!(config.clone().for_namespace(crate::DEFAULT_NAMESPACE).collection, "news_chunks");

        let a = config.clone().for_namespace("0b5c2c1e-session-a").collection;
        let b = config.for_namespace("7d41f9aa-session-b").collection;
        assert_eq!(a, "news_chunks_0b5c2c1e-session-a");
        assert_ne!(a, b);
    }
}
