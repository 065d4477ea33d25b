//! Paths and indexing settings

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use wws_core::{Error, IndexingConfig, Result, SourceCategory};

pub const DEFAULT_INDEX_DIR: &str = "./wws_index";
pub const REVIEWS_FOLDER: &str = "customer_reviews";
pub const REVIEWS_FILE: &str = "customer_reviews.csv";

/// Where documents are read from and where the index lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub index_dir: PathBuf,
    pub data_dir: PathBuf,
    pub indexing: IndexingConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            data_dir: PathBuf::from("."),
            indexing: IndexingConfig::default(),
        }
    }
}

impl RagConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            index_dir: env::var("WWS_INDEX_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_dir),
            data_dir: env::var("WWS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            indexing: IndexingConfig {
                chunk_size: env_usize("WWS_CHUNK_SIZE", defaults.indexing.chunk_size)?,
                chunk_overlap: env_usize("WWS_CHUNK_OVERLAP", defaults.indexing.chunk_overlap)?,
                batch_size: env_usize("WWS_BATCH_SIZE", defaults.indexing.batch_size)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the chunker and batcher cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.indexing.chunk_size == 0 {
            return Err(Error::Configuration("chunk size must be positive".to_string()));
        }
        if self.indexing.chunk_overlap >= self.indexing.chunk_size {
            return Err(Error::Configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.indexing.chunk_overlap, self.indexing.chunk_size
            )));
        }
        if self.indexing.batch_size == 0 {
            return Err(Error::Configuration("batch size must be positive".to_string()));
        }
        Ok(())
    }

    /// Folder holding the PDFs of a category
    pub fn pdf_folder(&self, category: SourceCategory) -> PathBuf {
        self.data_dir.join(category.as_str())
    }

    /// Path of the review CSV
    pub fn reviews_csv(&self) -> PathBuf {
        self.data_dir.join(REVIEWS_FOLDER).join(REVIEWS_FILE)
    }
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Configuration(format!("{} is not a number: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
