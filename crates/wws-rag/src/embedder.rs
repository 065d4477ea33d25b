//! Offline embedder
//!
//! Feature-hashing embeddings: no model server needed. Used for `--offline`
//! runs and throughout the tests.

use async_trait::async_trait;
use std::hash::Hasher;
use twox_hash::XxHash64;

use wws_core::{Embedder, Result};

pub const DEFAULT_DIMENSION: usize = 384;

/// Deterministic bag-of-words embedder based on hashed unigrams and bigrams.
/// Buckets come from seeded XXH64, so stored vectors stay valid across
/// toolchain upgrades.
pub struct HashEmbedder {
    dimension: usize,
    name: String,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            name: format!("hash-xxh64-{}", dimension),
        }
    }

    fn bucket(&self, token: &str) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        hasher.finish()
    }

    /// Embed one text synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let normalized = text.to_lowercase();
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| !w.is_empty())
            .collect();

        let dim = self.dimension as u64;
        let mut embedding = vec![0.0f32; self.dimension];

        for word in &words {
            let hash = self.bucket(word);
            embedding[(hash % dim) as usize] += 1.0;
            embedding[((hash >> 16) % dim) as usize] += 0.5;
        }

        for pair in words.windows(2) {
            let hash = self.bucket(&format!("{} {}", pair[0], pair[1]));
            embedding[(hash % dim) as usize] += 0.8;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in embedding.iter_mut() {
                *val /= magnitude;
            }
        }

        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
