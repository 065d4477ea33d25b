//! Ollama client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use wws_core::{Embedder, Error, GenerationConfig, GenerationResult, LLMProvider, Result};

use crate::config::OllamaConfig;

/// Ollama HTTP client, used for both generation and embeddings
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
    connected: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            config,
            client,
            connected: false,
        })
    }

    /// Whether `connect` succeeded
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn build_generate_request(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> GenerateRequest {
        GenerateRequest {
            model: config.model_id.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                num_predict: config.max_tokens,
                stop: config.stop_sequences.clone(),
            },
        }
    }

    /// Perform the actual generation request
    async fn perform_generation(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let request_body = self.build_generate_request(prompt, config);
        let url = format!("{}/api/generate", self.config.host);

        tracing::debug!(model = %config.model_id, prompt_chars = prompt.len(), "sending generate request");

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::LLMProvider(format!(
                "Ollama generate request failed with status {}: {}",
                status, error_text
            )));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let text = clean_answer(&data.response);
        if text.is_empty() {
            return Err(Error::LLMProvider(format!(
                "Empty response from model {}",
                config.model_id
            )));
        }

        Ok(GenerationResult {
            text,
            model_id: config.model_id.clone(),
            prompt_tokens: data.prompt_eval_count,
            completion_tokens: data.eval_count,
        })
    }
}

/// Trim model output and drop a leading `Answer:` label
pub(crate) fn clean_answer(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("Answer:")
        .map(str::trim)
        .unwrap_or(trimmed)
        .to_string()
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn connect(&mut self) -> Result<()> {
        let url = format!("{}/api/tags", self.config.host);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Ollama not reachable at {}: {}", self.config.host, e)))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Ollama health check failed: {}",
                response.status()
            )));
        }

        self.connected = true;
        tracing::info!(host = %self.config.host, "connected to Ollama");
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        let config = GenerationConfig {
            model_id: self.config.chat_model.clone(),
            timeout: Duration::from_secs(self.config.timeout_secs),
            ..Default::default()
        };
        self.generate_with_config(prompt, &config).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let generation_future = self.perform_generation(prompt, config);

        match timeout(config.timeout, generation_future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Request timed out".to_string())),
        }
    }

    fn model_id(&self) -> &str {
        &self.config.chat_model
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.config.host);
        let request_body = EmbedRequest {
            model: &self.config.embed_model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Embedding(format!(
                "Ollama embed request failed with status {}: {}",
                status, error_text
            )));
        }

        let data: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        if data.embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                data.embeddings.len()
            )));
        }

        Ok(data.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}
