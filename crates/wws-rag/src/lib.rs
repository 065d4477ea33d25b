//! Document ingestion, vector index and retrieval for the Water Works
//! Supply Chain assistant
//!
//! This crate provides the persisted local vector store, the PDF/CSV
//! loaders, the ingestion pipeline, the retrieval-budget allocator and the
//! RAG engine built on top of them.

pub mod budget;
mod config;
mod embedder;
mod engine;
mod ingest;
mod loader;
mod vector_store;


pub use budget::{KeywordScores, allocate, allocate_scores, detect_sku, score_question};
pub use config::{DEFAULT_INDEX_DIR, RagConfig};
pub use embedder::HashEmbedder;
pub use engine::WaterWorksRAGEngine;
pub use ingest::LocalDocumentIndexer;
pub use loader::{chunk_text, extract_pdf_text, list_pdfs, load_reviews};
pub use vector_store::{IndexManifest, IndexState, LocalVectorStore};

// Re-export core types for convenience
pub use wws_core::{
    Document, Embedder, Error, IndexingConfig, IndexingResult, RAGEngine, RAGResult, Result,
    RetrievalBudget, SearchConfig, SearchResult, SourceCategory, VectorDocument, VectorStore,
};
