use std::sync::Arc;
use clap::ValueEnum;
use nr_core::{EmbeddingModel, GraphStore, Result, Settings, VectorStore};

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StorageKind {
    #[default]
    Memory,
    Qdrant,
    Sqlite,
}

impl StorageKind {
    pub fn error_message(&self) -> &'static str {
        match self {
            StorageKind::Memory => "Memory storage should be available",
            StorageKind::Qdrant => "Qdrant should be running and the crate built with the `qdrant` feature",
            StorageKind::Sqlite => "SQLite needs the crate built with the `sqlite` feature",
        }
    }
}

/// Namespace used by single-run callers such as the CLI.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Vector backend for `kind`, holding only the chunks indexed under
/// `namespace`. SQLite only holds graphs, so it keeps vectors in memory.
pub async fn create_vector_store(
    kind: StorageKind,
    settings: &Settings,
    embedder: Arc<dyn EmbeddingModel>,
    namespace: &str,
) -> Result<Arc<dyn VectorStore>> {
    match kind {
        StorageKind::Memory => Ok(Arc::new(MemoryVectorStore::new(embedder))),
        StorageKind::Sqlite => {
            tracing::info!("SQLite backs the graph only, keeping vectors in memory");
            Ok(Arc::new(MemoryVectorStore::new(embedder)))
        }
        #[cfg(feature = "qdrant")]
        StorageKind::Qdrant => {
            let config = backends::qdrant::QdrantConfig::from_settings(settings).for_namespace(namespace);
            Ok(Arc::new(backends::qdrant::QdrantVectorStore::new(config, embedder).await?))
        }
        #[cfg(not(feature = "qdrant"))]
        StorageKind::Qdrant => {
            let _ = (settings, namespace);
            Err(nr_core::Error::InvalidConfig(kind.error_message().to_string()))
        }
    }
}

/// Graph backend for `kind`, scoped to the graph named `namespace`. Qdrant
/// only holds vectors, so it keeps the graph in memory.
pub async fn create_graph_store(
    kind: StorageKind,
    settings: &Settings,
    namespace: &str,
) -> Result<Arc<dyn GraphStore>> {
    match kind {
        StorageKind::Memory => Ok(Arc::new(MemoryGraphStore::new())),
        StorageKind::Qdrant => {
            tracing::info!("Qdrant backs vectors only, keeping the graph in memory");
            Ok(Arc::new(MemoryGraphStore::new()))
        }
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let path = std::path::Path::new(&settings.sqlite_path);
            Ok(Arc::new(backends::sqlite::SqliteGraphStore::new_with_path(path, namespace).await?))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => {
            let _ = (settings, namespace);
            Err(nr_core::Error::InvalidConfig(kind.error_message().to_string()))
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_graph_store, create_vector_store, StorageKind, DEFAULT_NAMESPACE};
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct ConstEmbedder;

    #[async_trait]
    impl EmbeddingModel for ConstEmbedder {
        async fn generate_embeddings(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_memory_factories() {
        let settings = Settings::default();
        let vectors = create_vector_store(StorageKind::Memory, &settings, Arc::new(ConstEmbedder), DEFAULT_NAMESPACE)
            .await
            .unwrap();
        assert_eq!(vectors.len().await.unwrap(), 0);

        let graph = create_graph_store(StorageKind::Memory, &settings, DEFAULT_NAMESPACE)
            .await
            .unwrap();
        assert_eq!(graph.node_count().await.unwrap(), 0);
    }

    #[cfg(not(feature = "qdrant"))]
    #[tokio::test]
    async fn test_qdrant_needs_feature() {
        let settings = Settings::default();
        let result = create_vector_store(StorageKind::Qdrant, &settings, Arc::new(ConstEmbedder), "s1").await;
        assert!(matches!(result, Err(nr_core::Error::InvalidConfig(_))));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_sessions_do_not_share_a_graph() {
        use nr_core::storage::labels;
        use nr_core::GraphNode;

        let temp_dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            sqlite_path: temp_dir.path().join("graph.db").to_string_lossy().into_owned(),
            ..Default::default()
        };
        let a = create_graph_store(StorageKind::Sqlite, &settings, "session-a").await.unwrap();
        let b = create_graph_store(StorageKind::Sqlite, &settings, "session-b").await.unwrap();

        a.upsert_node(GraphNode::new(labels::KEYWORD, "nba")).await.unwrap();
        assert_eq!(b.node_count().await.unwrap(), 0);

        b.erase_all().await.unwrap();
        assert_eq!(a.node_count().await.unwrap(), 1);
    }
}
