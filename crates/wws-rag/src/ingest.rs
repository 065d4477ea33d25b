//! Ingestion: PDFs and reviews into the vector store

use std::path::Path;
use std::sync::Arc;

use wws_core::{Document, IndexingResult, Result, SourceCategory, VectorDocument, VectorStore};

use crate::config::RagConfig;
use crate::loader::{chunk_text, extract_pdf_text, list_pdfs, load_reviews};

/// Loads the document set and writes it to a vector store
pub struct LocalDocumentIndexer<V: VectorStore> {
    vector_store: Arc<V>,
    config: RagConfig,
}

impl<V: VectorStore> LocalDocumentIndexer<V> {
    /// Create a new indexer writing into `vector_store`
    pub fn new(vector_store: Arc<V>, config: RagConfig) -> Self {
        Self {
            vector_store,
            config,
        }
    }

    /// Index every PDF folder and the review CSV. The store is told the
    /// pass is finished only when every batch was written and it holds at
    /// least one document; otherwise the next run ingests again.
    pub async fn index_all(&self) -> Result<IndexingResult> {
        let mut result = IndexingResult::default();
        let mut documents = Vec::new();

        for category in SourceCategory::pdf_folders() {
            documents.extend(self.load_pdf_folder(category, &mut result));
        }
        documents.extend(self.load_review_documents(&mut result));

        let written = self.index_documents(documents).await?;
        let write_failures = written.documents_failed;
        result.merge(written);

        if write_failures == 0 && self.vector_store.count().await? > 0 {
            self.vector_store.finish_ingestion().await?;
        } else {
            tracing::warn!(
                write_failures,
                "ingestion incomplete, it will run again on the next start"
            );
        }

        tracing::info!(
            indexed = result.documents_indexed,
            skipped = result.documents_skipped,
            failed = result.documents_failed,
            "ingestion finished"
        );
        Ok(result)
    }

    /// Chunk every PDF in a category folder. Unreadable files are logged,
    /// recorded in `result`, and skipped.
    pub fn load_pdf_folder(
        &self,
        category: SourceCategory,
        result: &mut IndexingResult,
    ) -> Vec<Document> {
        let folder = self.config.pdf_folder(category);
        let pdfs = match list_pdfs(&folder) {
            Ok(pdfs) => pdfs,
            Err(e) => {
                tracing::warn!(folder = %folder.display(), error = %e, "cannot read PDF folder");
                result.errors.push(format!("{}: {}", folder.display(), e));
                return Vec::new();
            }
        };

        let mut documents = Vec::new();
        for path in pdfs {
            match self.load_pdf(category, &path) {
                Ok(chunks) => documents.extend(chunks),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping unreadable PDF");
                    result.record_failure(e.to_string());
                }
            }
        }
        documents
    }

    fn load_pdf(&self, category: SourceCategory, path: &Path) -> Result<Vec<Document>> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let text = extract_pdf_text(path)?;

        let chunks = chunk_text(
            &text,
            self.config.indexing.chunk_size,
            self.config.indexing.chunk_overlap,
        );
        if chunks.is_empty() {
            tracing::warn!(file = %path.display(), "PDF has no extractable text");
        }

        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| Document::pdf_chunk(category, &filename, i, chunk))
            .collect())
    }

    /// Turn the review CSV into documents. A CSV that cannot be opened or
    /// lacks a column is logged and yields no documents.
    pub fn load_review_documents(&self, result: &mut IndexingResult) -> Vec<Document> {
        let path = self.config.reviews_csv();
        let rows = match load_reviews(&path) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping review CSV");
                result.errors.push(e.to_string());
                return Vec::new();
            }
        };

        for error in rows.errors {
            tracing::warn!(error = %error, "skipping malformed review row");
            result.record_failure(error);
        }

        rows.records
            .iter()
            .map(|(row_index, record)| Document::review(*row_index, record))
            .collect()
    }

    /// Write documents whose id is not yet indexed, in batches
    pub async fn index_documents(&self, documents: Vec<Document>) -> Result<IndexingResult> {
        let mut result = IndexingResult::default();

        let mut pending = Vec::with_capacity(documents.len());
        for document in documents {
            if self.vector_store.contains(&document.id).await? {
                result.documents_skipped += 1;
            } else {
                pending.push(VectorDocument::from(document));
            }
        }

        if pending.is_empty() {
            return Ok(result);
        }

        let batch_size = self.config.indexing.batch_size.max(1);
        let total_batches = pending.len().div_ceil(batch_size);

        for (i, batch) in pending.chunks(batch_size).enumerate() {
            tracing::info!("Adding batch {}/{}", i + 1, total_batches);
            let batch_len = batch.len();

            match self.vector_store.store_batch(batch.to_vec()).await {
                Ok(ids) => {
                    result.documents_indexed += ids.len();
                    result.documents_skipped += batch_len - ids.len();
                }
                Err(e) => {
                    tracing::warn!(batch = i + 1, error = %e, "failed to store batch");
                    for doc in batch {
                        result.record_failure(format!("{}: {}", doc.id, e));
                    }
                }
            }
        }

        Ok(result)
    }
}
