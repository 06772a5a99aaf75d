use std::sync::Arc;
use clap::ValueEnum;
use nr_core::{EmbeddingModel, InferenceModel, Result, Settings};
use crate::embeddings::HashEmbedder;

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAiModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModelKind {
    /// OpenAI-compatible chat completions and embeddings
    #[default]
    Openai,
    /// Offline deterministic model with local hashed embeddings
    Dummy,
}

pub fn create_model(kind: ModelKind, settings: &Settings) -> Result<Arc<dyn InferenceModel>> {
    let model: Arc<dyn InferenceModel> = match kind {
        ModelKind::Openai => Arc::new(OpenAiModel::from_settings(settings)?),
        ModelKind::Dummy => Arc::new(DummyModel::new()),
    };
    tracing::info!("🤖 Using inference model {}", model.name());
    Ok(model)
}

pub fn create_embedder(kind: ModelKind, settings: &Settings) -> Result<Arc<dyn EmbeddingModel>> {
    match kind {
        ModelKind::Openai => Ok(Arc::new(OpenAiModel::from_settings(settings)?)),
        ModelKind::Dummy => Ok(Arc::new(HashEmbedder::default())),
    }
}
