//! Documents produced by ingestion and the types that describe an ingestion run

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::sku;

/// Category a document belongs to. Each category has its own retriever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// Internal/HR documents (`internal_docs/`)
    InternalDocs,
    /// Product documentation (`product_docs/`)
    ProductDocs,
    /// Customer reviews (`customer_reviews/customer_reviews.csv`)
    Reviews,
}

impl SourceCategory {
    /// Name stored in document metadata under `source`
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceCategory::InternalDocs => "internal_docs",
            SourceCategory::ProductDocs => "product_docs",
            SourceCategory::Reviews => "reviews",
        }
    }

    /// Display label used in the formatted context
    pub fn label(&self) -> &'static str {
        match self {
            SourceCategory::InternalDocs => "Internal",
            SourceCategory::ProductDocs => "Product",
            SourceCategory::Reviews => "Review",
        }
    }

    /// Get all categories, in retrieval order
    pub fn all() -> [SourceCategory; 3] {
        [
            SourceCategory::InternalDocs,
            SourceCategory::ProductDocs,
            SourceCategory::Reviews,
        ]
    }

    /// Categories whose documents come from PDF folders
    pub fn pdf_folders() -> [SourceCategory; 2] {
        [SourceCategory::InternalDocs, SourceCategory::ProductDocs]
    }

    /// Parse from the metadata name
    pub fn from_name(s: &str) -> Option<SourceCategory> {
        match s {
            "internal_docs" => Some(SourceCategory::InternalDocs),
            "product_docs" => Some(SourceCategory::ProductDocs),
            "reviews" => Some(SourceCategory::Reviews),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the customer review CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Review_Text")]
    pub review_text: String,
    #[serde(rename = "Rating")]
    pub rating: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Customer_ID")]
    pub customer_id: String,
}

/// A unit of retrievable text. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub category: SourceCategory,
    pub metadata: serde_json::Value,
}

impl Document {
    /// Build a document from one chunk of a PDF
    pub fn pdf_chunk(
        category: SourceCategory,
        filename: &str,
        chunk_index: usize,
        content: String,
    ) -> Self {
        Self {
            id: format!("{}_{}_{}", category.as_str(), filename, chunk_index),
            content,
            category,
            metadata: json!({
                "source": category.as_str(),
                "filename": filename,
                "chunk": chunk_index,
            }),
        }
    }

    /// Build a document from a review row. `row_index` is the 0-based data row.
    pub fn review(row_index: usize, record: &ReviewRecord) -> Self {
        let sku = record.sku.trim();
        let product_name = sku::product_name(sku);
        Self {
            id: format!("review_{}", row_index),
            content: format!("{} ({}) - {}", product_name, sku, record.review_text.trim()),
            category: SourceCategory::Reviews,
            metadata: json!({
                "source": SourceCategory::Reviews.as_str(),
                "sku": sku,
                "product_name": product_name,
                "rating": record.rating.trim(),
                "date": record.date.trim(),
                "customer_id": record.customer_id.trim(),
            }),
        }
    }
}

/// Result of an indexing operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingResult {
    pub documents_indexed: usize,
    pub documents_skipped: usize,
    pub documents_failed: usize,
    pub errors: Vec<String>,
}

impl IndexingResult {
    /// Record a failure that was logged and skipped
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.documents_failed += 1;
        self.errors.push(error.into());
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: IndexingResult) {
        self.documents_indexed += other.documents_indexed;
        self.documents_skipped += other.documents_skipped;
        self.documents_failed += other.documents_failed;
        self.errors.extend(other.errors);
    }
}

/// Configuration for document indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            batch_size: 100,
        }
    }
}
