//! Vector store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Document, Result, SourceCategory};

/// A document stored in the vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: String,
    pub content: String,
    pub category: SourceCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub metadata: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl From<Document> for VectorDocument {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            content: doc.content,
            category: doc.category,
            embedding: None,
            metadata: doc.metadata,
            score: None,
        }
    }
}

/// Search result from vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub documents: Vec<VectorDocument>,
    pub total: usize,
}

/// Configuration for vector search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    /// Restrict the search to one category
    pub category: Option<SourceCategory>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            category: None,
        }
    }
}

impl SearchConfig {
    /// Top-k search within one category
    pub fn for_category(category: SourceCategory, top_k: usize) -> Self {
        Self {
            top_k,
            category: Some(category),
        }
    }
}

/// Trait for vector stores
///
/// A store embeds what it is given, persists it, and answers similarity
/// queries. Writes never replace a document whose id is already present.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Open the store, creating or rebuilding its persisted state as needed
    async fn connect(&mut self) -> Result<()>;

    /// Store documents in batch. Returns the ids actually written; ids that
    /// already exist are skipped.
    async fn store_batch(&self, documents: Vec<VectorDocument>) -> Result<Vec<String>>;

    /// Search for documents similar to a text query
    async fn search(&self, query: &str, config: &SearchConfig) -> Result<SearchResult>;

    /// Search using a vector embedding
    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<SearchResult>;

    /// Check whether a document id is present
    async fn contains(&self, id: &str) -> Result<bool>;

    /// Get a document by ID
    async fn get(&self, id: &str) -> Result<Option<VectorDocument>>;

    /// Remove every document, persisted state included
    async fn clear(&self) -> Result<()>;

    /// Get the total number of documents
    async fn count(&self) -> Result<usize>;

    /// Get the number of documents in one category
    async fn count_category(&self, category: SourceCategory) -> Result<usize>;

    /// Record that an ingestion pass wrote every document it loaded
    async fn finish_ingestion(&self) -> Result<()> {
        Ok(())
    }

    /// Check if the vector store is connected
    fn is_connected(&self) -> bool;
}
