//! Core traits and types for the Water Works Supply Chain assistant
//!
//! This crate defines the interfaces shared across the workspace: LLM and
//! embedding providers, the vector store, the RAG engine, and the document
//! model with its fixed SKU table.

pub mod document;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod rag;
pub mod sku;
pub mod vector_store;

pub use document::{Document, IndexingConfig, IndexingResult, ReviewRecord, SourceCategory};
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use llm::{GenerationConfig, GenerationResult, LLMProvider};
pub use rag::{RAGEngine, RAGResult, RetrievalBudget};
pub use vector_store::{SearchConfig, SearchResult, VectorDocument, VectorStore};
