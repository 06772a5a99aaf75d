use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use nr_core::storage::Properties;
use nr_core::{
    cosine_similarity, Chunk, EmbeddingModel, GraphEdge, GraphNode, GraphQuery, GraphRow,
    GraphStore, NodeKey, Result, RetrievedFragment, VectorStore,
};
use super::rows;

/// Brute-force cosine search over embedded chunks held in memory.
pub struct MemoryVectorStore {
    embedder: Arc<dyn EmbeddingModel>,
    entries: RwLock<Vec<(Chunk, Vec<f32>)>>,
}

impl MemoryVectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn index(&self, chunks: &[Chunk]) -> Result<()> {
        let mut embedded = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = self.embedder.generate_embeddings(&chunk.text).await?;
            embedded.push((chunk.clone(), embedding));
        }

        let mut entries = self.entries.write().await;
        entries.extend(embedded);
        tracing::debug!("Indexed {} chunks, {} total", chunks.len(), entries.len());
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedFragment>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.generate_embeddings(query).await?;
        let entries = self.entries.read().await;

        let mut scored: Vec<(f32, &Chunk)> = entries
            .iter()
            .map(|(chunk, embedding)| (cosine_similarity(&query_embedding, embedding), chunk))
            .collect();
        // stable: equal scores keep indexing order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(idx, (score, chunk))| RetrievedFragment {
                source_title: chunk.title.clone(),
                source_url: chunk.url.clone(),
                text_snippet: chunk.text.clone(),
                relevance_rank: idx + 1,
                score,
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[derive(Default)]
struct GraphData {
    next_seq: u64,
    nodes: BTreeMap<NodeKey, (u64, Properties)>,
    edges: BTreeSet<GraphEdge>,
}

/// Property graph kept in memory: nodes merge on `(label, key)`, edges are a set.
#[derive(Default)]
pub struct MemoryGraphStore {
    data: RwLock<GraphData>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_node(&self, node: GraphNode) -> Result<()> {
        let mut data = self.data.write().await;
        let seq = data.next_seq;
        let entry = data
            .nodes
            .entry(node.key)
            .or_insert_with(|| (seq, Properties::new()));
        let inserted = entry.0 == seq;
        entry.1.extend(node.properties);
        if inserted {
            data.next_seq += 1;
        }
        Ok(())
    }

    async fn upsert_edge(&self, edge: GraphEdge) -> Result<()> {
        let mut data = self.data.write().await;
        if !data.nodes.contains_key(&edge.from) || !data.nodes.contains_key(&edge.to) {
            return Err(nr_core::Error::Storage(format!(
                "Cannot link {} to {}: missing node",
                edge.from, edge.to
            )));
        }
        data.edges.insert(edge);
        Ok(())
    }

    async fn run(&self, query: &GraphQuery) -> Result<Vec<GraphRow>> {
        let data = self.data.read().await;
        match query {
            GraphQuery::ContentWithKeywords { label, relation, limit, preview_chars } => {
                let mut content: Vec<(&NodeKey, &(u64, Properties))> = data
                    .nodes
                    .iter()
                    .filter(|(key, _)| &key.label == label)
                    .collect();
                content.sort_by_key(|(_, (seq, _))| *seq);

                Ok(content
                    .into_iter()
                    .take(*limit)
                    .map(|(key, (_, properties))| {
                        let keywords = data
                            .edges
                            .iter()
                            .filter(|e| &e.from == key && &e.relation == relation)
                            .map(|e| e.to.key.clone())
                            .collect();
                        rows::content_row(properties, keywords, *preview_chars)
                    })
                    .collect())
            }
            GraphQuery::SharedAttributePairs { label, attribute } => Ok(rows::shared_attribute_pairs(
                data.nodes
                    .iter()
                    .filter(|(key, _)| &key.label == label)
                    .map(|(key, (_, properties))| (key, properties)),
                attribute,
            )),
        }
    }

    async fn erase_all(&self) -> Result<()> {
        let mut data = self.data.write().await;
        *data = GraphData::default();
        Ok(())
    }

    async fn node_count(&self) -> Result<usize> {
        Ok(self.data.read().await.nodes.len())
    }
}
