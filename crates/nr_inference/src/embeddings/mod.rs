use std::fmt;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use nr_core::{EmbeddingModel, Result};

pub const DEFAULT_HASH_DIMENSIONS: usize = 384;

/// Local bag-of-words embedder: every lower-cased token is hashed into one
/// of `dimensions` buckets with a hashed sign, and the result is L2-normalized.
/// Texts sharing vocabulary end up close under cosine similarity.
pub struct HashEmbedder {
    dimensions: usize,
}

impl fmt::Debug for HashEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashEmbedder")
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());
        let mut index_bytes = [0u8; 8];
        index_bytes.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(index_bytes) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSIONS)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingModel for HashEmbedder {
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let (index, sign) = self.bucket(&token);
            embedding[index] += sign;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
