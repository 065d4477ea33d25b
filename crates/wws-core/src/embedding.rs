//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Turns text into vectors for similarity search.
///
/// Every vector returned by one embedder has the same dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::Error::Embedding("Embedder returned no vector".to_string()))
    }

    /// Name of the embedding model, recorded in the index manifest
    fn model_name(&self) -> &str;
}
