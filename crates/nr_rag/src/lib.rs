pub mod chunker;
pub mod context;
pub mod graph;
pub mod vector;

pub use chunker::TextChunker;
pub use context::{ContextAssembler, ContextBlock};
pub use graph::{GraphBuildReport, GraphBuildRequest, GraphRag};
pub use vector::{VectorAnswer, VectorRag};

pub mod prelude {
    pub use super::{GraphBuildRequest, GraphRag, VectorAnswer, VectorRag};
    pub use nr_core::{Error, Result};
}
