//! Ollama integration for the Water Works Supply Chain assistant
//!
//! This crate provides the Ollama implementation of the `LLMProvider` and
//! `Embedder` traits.

mod client;
mod config;


pub use client::OllamaClient;
pub use config::{
    DEFAULT_CHAT_MODEL, DEFAULT_EMBED_MODEL, DEFAULT_HOST, DEFAULT_TIMEOUT_SECS, OllamaConfig,
};

// Re-export core types for convenience
pub use wws_core::{Embedder, Error, GenerationConfig, GenerationResult, LLMProvider, Result};
