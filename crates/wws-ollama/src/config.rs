//! Ollama configuration

use serde::{Deserialize, Serialize};
use std::env;
use wws_core::{Error, Result};

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_CHAT_MODEL: &str = "llama3.2";
pub const DEFAULT_EMBED_MODEL: &str = "mxbai-embed-large";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the Ollama client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: String,
    pub chat_model: String,
    pub embed_model: String,
    pub timeout_secs: u64,
}

impl OllamaConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let host = normalize_host(&host)?;

        let chat_model =
            env::var("OLLAMA_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        let embed_model =
            env::var("OLLAMA_EMBED_MODEL").unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string());

        let timeout_secs = match env::var("OLLAMA_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Configuration(format!("OLLAMA_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            host,
            chat_model,
            embed_model,
            timeout_secs,
        })
    }

    /// Create configuration with explicit values
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the chat model
    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    /// Override the embedding model
    pub fn with_embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = model.into();
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

/// Ollama accepts `OLLAMA_HOST` without a scheme (`0.0.0.0:11434`); the
/// HTTP client needs one.
fn normalize_host(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Configuration("OLLAMA_HOST is empty".to_string()));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("http://{}", trimmed))
    }
}
