use async_trait::async_trait;
use std::fmt;
use crate::Result;

/// Sampling parameters for a single completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::new(0.1)
    }
}

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`. Failures surface as `Error::Generation`
    /// or a transport error.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}

#[async_trait]
pub trait EmbeddingModel: Send + Sync + fmt::Debug {
    /// Generate embeddings for a piece of text
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
