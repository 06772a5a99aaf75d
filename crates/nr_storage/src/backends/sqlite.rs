use async_trait::async_trait;
use std::path::Path;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use nr_core::storage::Properties;
use nr_core::{GraphEdge, GraphNode, GraphQuery, GraphRow, GraphStore, NodeKey, Result};
use super::rows;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS graph_nodes (
        graph TEXT NOT NULL,
        label TEXT NOT NULL,
        key TEXT NOT NULL,
        props TEXT NOT NULL,
        PRIMARY KEY (graph, label, key)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS graph_edges (
        graph TEXT NOT NULL,
        from_label TEXT NOT NULL,
        from_key TEXT NOT NULL,
        relation TEXT NOT NULL,
        to_label TEXT NOT NULL,
        to_key TEXT NOT NULL,
        PRIMARY KEY (graph, from_label, from_key, relation, to_label, to_key)
    )
    "#,
];

fn storage_err(what: &str, e: sqlx::Error) -> nr_core::Error {
    nr_core::Error::Storage(format!("{}: {}", what, e))
}

/// Property graph persisted in two SQLite tables. Every row carries the name
/// of the graph it belongs to, so several graphs can share one database file
/// and erasing one leaves the others alone.
pub struct SqliteGraphStore {
    pool: SqlitePool,
    graph: String,
}

impl SqliteGraphStore {
    pub async fn new_with_path(db_path: &Path, graph: &str) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| storage_err("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| storage_err(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self {
            pool,
            graph: graph.to_string(),
        })
    }

    async fn nodes_with_label(&self, label: &str, limit: Option<usize>) -> Result<Vec<(NodeKey, Properties)>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = sqlx::query("SELECT key, props FROM graph_nodes WHERE graph = ? AND label = ? ORDER BY rowid LIMIT ?")
            .bind(&self.graph)
            .bind(label)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_err("Failed to read nodes", e))?;

        rows.into_iter()
            .map(|row| -> Result<(NodeKey, Properties)> {
                let props: String = row.get("props");
                Ok((NodeKey::new(label, row.get::<String, _>("key")), serde_json::from_str(&props)?))
            })
            .collect()
    }

    async fn linked_keys(&self, from: &NodeKey, relation: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT to_key FROM graph_edges WHERE graph = ? AND from_label = ? AND from_key = ? AND relation = ? ORDER BY to_key",
        )
        .bind(&self.graph)
        .bind(&from.label)
        .bind(&from.key)
        .bind(relation)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to read edges", e))?;

        Ok(rows.into_iter().map(|row| row.get("to_key")).collect())
    }

    async fn node_exists(&self, key: &NodeKey) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM graph_nodes WHERE graph = ? AND label = ? AND key = ?")
            .bind(&self.graph)
            .bind(&key.label)
            .bind(&key.key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("Failed to look up node", e))?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn upsert_node(&self, node: GraphNode) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("Failed to start transaction", e))?;

        let existing = sqlx::query("SELECT props FROM graph_nodes WHERE graph = ? AND label = ? AND key = ?")
            .bind(&self.graph)
            .bind(&node.key.label)
            .bind(&node.key.key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| storage_err("Failed to read node", e))?;

        let mut properties: Properties = match existing {
            Some(row) => serde_json::from_str(&row.get::<String, _>("props"))?,
            None => Properties::new(),
        };
        properties.extend(node.properties);

        sqlx::query(
            r#"
            INSERT INTO graph_nodes (graph, label, key, props) VALUES (?, ?, ?, ?)
            ON CONFLICT (graph, label, key) DO UPDATE SET props = excluded.props
            "#,
        )
        .bind(&self.graph)
        .bind(&node.key.label)
        .bind(&node.key.key)
        .bind(serde_json::to_string(&properties)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to store node", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_err("Failed to commit node", e))?;
        Ok(())
    }

    async fn upsert_edge(&self, edge: GraphEdge) -> Result<()> {
        if !self.node_exists(&edge.from).await? || !self.node_exists(&edge.to).await? {
            return Err(nr_core::Error::Storage(format!(
                "Cannot link {} to {}: missing node",
                edge.from, edge.to
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO graph_edges (graph, from_label, from_key, relation, to_label, to_key)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&self.graph)
        .bind(&edge.from.label)
        .bind(&edge.from.key)
        .bind(&edge.relation)
        .bind(&edge.to.label)
        .bind(&edge.to.key)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to store edge", e))?;
        Ok(())
    }

    async fn run(&self, query: &GraphQuery) -> Result<Vec<GraphRow>> {
        match query {
            GraphQuery::ContentWithKeywords { label, relation, limit, preview_chars } => {
                let mut rows = Vec::new();
                for (key, properties) in self.nodes_with_label(label, Some(*limit)).await? {
                    let keywords = self.linked_keys(&key, relation).await?;
                    rows.push(rows::content_row(&properties, keywords, *preview_chars));
                }
                Ok(rows)
            }
            GraphQuery::SharedAttributePairs { label, attribute } => {
                let nodes = self.nodes_with_label(label, None).await?;
                Ok(rows::shared_attribute_pairs(nodes.iter().map(|(k, p)| (k, p)), attribute))
            }
        }
    }

    async fn erase_all(&self) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("Failed to start transaction", e))?;
        for table in ["graph_edges", "graph_nodes"] {
            sqlx::query(&format!("DELETE FROM {} WHERE graph = ?", table))
                .bind(&self.graph)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_err("Failed to erase graph", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| storage_err("Failed to commit erase", e))?;
        Ok(())
    }

    async fn node_count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM graph_nodes WHERE graph = ?")
            .bind(&self.graph)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_err("Failed to count nodes", e))?;
        Ok(row.get::<i64, _>("n") as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nr_core::storage::{labels, props};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_graph_store() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("graph.db");
        let store = SqliteGraphStore::new_with_path(&db_path, "default").await.unwrap();

        for (id, name) in [("1", "Lakers"), ("2", "Clippers"), ("1", "Lakers")] {
            store
                .upsert_node(
                    GraphNode::new(labels::TEAM, id)
                        .with_property(props::NAME, Some(name))
                        .with_property(props::VENUE, Some("Crypto.com Arena")),
                )
                .await
                .unwrap();
        }
        assert_eq!(store.node_count().await.unwrap(), 2);

        let pairs = store
            .run(&GraphQuery::SharedAttributePairs {
                label: labels::TEAM.to_string(),
                attribute: props::VENUE.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(pairs.len(), 1);

        store
            .upsert_node(GraphNode::new(labels::NEWS, "n1").with_property(props::TITLE, Some("Game night")))
            .await
            .unwrap();
        store.upsert_node(GraphNode::new(labels::KEYWORD, "nba")).await.unwrap();
        let edge = GraphEdge {
            from: NodeKey::new(labels::NEWS, "n1"),
            relation: labels::MENTIONS.to_string(),
            to: NodeKey::new(labels::KEYWORD, "nba"),
        };
        store.upsert_edge(edge.clone()).await.unwrap();
        store.upsert_edge(edge).await.unwrap();

        let content = store
            .run(&GraphQuery::ContentWithKeywords {
                label: labels::NEWS.to_string(),
                relation: labels::MENTIONS.to_string(),
                limit: 5,
                preview_chars: 300,
            })
            .await
            .unwrap();
        assert_eq!(
            content,
            vec![GraphRow::Content {
                title: "Game night".to_string(),
                url: String::new(),
                preview: String::new(),
                keywords: vec!["nba".to_string()],
            }]
        );

        store.erase_all().await.unwrap();
        assert_eq!(store.node_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reopen_keeps_graph() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("graph.db");
        {
            let store = SqliteGraphStore::new_with_path(&db_path, "default").await.unwrap();
            store.upsert_node(GraphNode::new(labels::KEYWORD, "nba")).await.unwrap();
        }
        let store = SqliteGraphStore::new_with_path(&db_path, "default").await.unwrap();
        assert_eq!(store.node_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_graphs_sharing_a_file_are_isolated() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("graph.db");
        let first = SqliteGraphStore::new_with_path(&db_path, "first").await.unwrap();
        let second = SqliteGraphStore::new_with_path(&db_path, "second").await.unwrap();

        first
            .upsert_node(GraphNode::new(labels::NEWS, "n1").with_property(props::TITLE, Some("Game night")))
            .await
            .unwrap();
        first.upsert_node(GraphNode::new(labels::KEYWORD, "nba")).await.unwrap();
        second.upsert_node(GraphNode::new(labels::KEYWORD, "nba")).await.unwrap();
        assert_eq!(first.node_count().await.unwrap(), 2);
        assert_eq!(second.node_count().await.unwrap(), 1);

        // the news node lives in the first graph only
        let edge = GraphEdge {
            from: NodeKey::new(labels::NEWS, "n1"),
            relation: labels::MENTIONS.to_string(),
            to: NodeKey::new(labels::KEYWORD, "nba"),
        };
        assert!(second.upsert_edge(edge.clone()).await.is_err());
        first.upsert_edge(edge).await.unwrap();

        let query = GraphQuery::ContentWithKeywords {
            label: labels::NEWS.to_string(),
            relation: labels::MENTIONS.to_string(),
            limit: 5,
            preview_chars: 300,
        };
        assert!(second.run(&query).await.unwrap().is_empty());

        second.erase_all().await.unwrap();
        assert_eq!(second.node_count().await.unwrap(), 0);
        assert_eq!(first.node_count().await.unwrap(), 2);
        assert_eq!(first.run(&query).await.unwrap().len(), 1);
    }
}
