//! RAG (Retrieval-Augmented Generation) engine trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, VectorDocument};

/// Number of documents requested from each category for one question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalBudget {
    pub internal: usize,
    pub product: usize,
    pub reviews: usize,
}

impl RetrievalBudget {
    pub fn new(internal: usize, product: usize, reviews: usize) -> Self {
        Self {
            internal,
            product,
            reviews,
        }
    }

    /// Sum of the three shares
    pub fn total(&self) -> usize {
        self.internal + self.product + self.reviews
    }
}

/// Result from RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGResult {
    pub documents: Vec<VectorDocument>,
    pub context: String,
    pub budget: RetrievalBudget,
    /// SKU token that triggered a supplementary retrieval, if any
    pub sku: Option<String>,
    pub supplementary_count: usize,
}

/// Trait for RAG engines
#[async_trait]
pub trait RAGEngine: Send + Sync {
    /// Initialize the RAG engine
    async fn initialize(&mut self) -> Result<()>;

    /// Retrieve relevant documents for a question
    async fn retrieve(&self, question: &str) -> Result<RAGResult>;

    /// Build context from retrieved documents
    fn build_context(&self, documents: &[VectorDocument]) -> String;

    /// Get statistics about the RAG engine
    async fn stats(&self) -> Result<serde_json::Value>;

    /// Check if the RAG engine is ready
    fn is_ready(&self) -> bool;
}
