pub mod embeddings;
pub mod models;

pub use embeddings::HashEmbedder;
pub use models::{create_embedder, create_model, DummyModel, ModelKind, OpenAiModel};

pub mod prelude {
    pub use super::models::{create_embedder, create_model, ModelKind};
    pub use nr_core::{CompletionOptions, EmbeddingModel, Error, InferenceModel, Result};
}
