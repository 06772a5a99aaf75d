use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use crate::types::{Chunk, RetrievedFragment};
use crate::Result;

pub mod labels {
    pub const TEAM: &str = "Team";
    pub const NEWS: &str = "News";
    pub const KEYWORD: &str = "Keyword";
    pub const MENTIONS: &str = "MENTIONS";
}

/// Node property names shared by the graph builders and the backends.
pub mod props {
    pub const NAME: &str = "name";
    pub const LOCATION: &str = "location";
    pub const VENUE: &str = "venue";
    pub const LEAGUE: &str = "league";
    pub const TITLE: &str = "title";
    pub const URL: &str = "url";
    pub const TEXT: &str = "text";
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and store chunks for later nearest-neighbour retrieval.
    async fn index(&self, chunks: &[Chunk]) -> Result<()>;

    /// Return at most `k` fragments, most relevant first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedFragment>>;

    /// Number of indexed chunks.
    async fn len(&self) -> Result<usize>;
}

pub type Properties = BTreeMap<String, String>;

/// Identity of a graph node: nodes merge on `(label, key)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub label: String,
    pub key: String,
}

impl NodeKey {
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.label, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub key: NodeKey,
    pub properties: Properties,
}

impl GraphNode {
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: NodeKey::new(label, key),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.properties.insert(name.to_string(), value.into());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeKey,
    pub relation: String,
    pub to: NodeKey,
}

/// The structured retrievals a graph backend has to answer.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphQuery {
    /// Up to `limit` content nodes with the keywords they link to through
    /// `relation`, text cut to `preview_chars`.
    ContentWithKeywords {
        label: String,
        relation: String,
        limit: usize,
        preview_chars: usize,
    },
    /// Every unordered pair of distinct `label` nodes whose `attribute`
    /// values are equal and non-empty.
    SharedAttributePairs { label: String, attribute: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphRow {
    Content {
        title: String,
        url: String,
        preview: String,
        keywords: Vec<String>,
    },
    Pair {
        left: String,
        right: String,
        shared: String,
    },
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Insert the node or merge its properties into the existing one.
    async fn upsert_node(&self, node: GraphNode) -> Result<()>;

    /// Link two existing nodes; linking twice has no further effect.
    async fn upsert_edge(&self, edge: GraphEdge) -> Result<()>;

    async fn run(&self, query: &GraphQuery) -> Result<Vec<GraphRow>>;

    /// Delete all nodes and edges.
    async fn erase_all(&self) -> Result<()>;

    async fn node_count(&self) -> Result<usize>;
}
