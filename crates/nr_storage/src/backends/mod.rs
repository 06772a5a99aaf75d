pub mod memory;
mod rows;

#[cfg(feature = "qdrant")]
pub mod qdrant;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{MemoryGraphStore, MemoryVectorStore};

#[cfg(feature = "qdrant")]
pub use qdrant::{QdrantConfig, QdrantVectorStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteGraphStore;
