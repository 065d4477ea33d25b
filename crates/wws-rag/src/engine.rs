//! RAG engine implementation

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use wws_core::{
    Error, RAGEngine, RAGResult, Result, RetrievalBudget, SearchConfig, SourceCategory,
    VectorDocument, VectorStore,
};

use crate::budget::{SKU_SUPPLEMENT_LIMIT, allocate, detect_sku};

/// Category-aware retrieval over the local index
pub struct WaterWorksRAGEngine<V: VectorStore> {
    vector_store: Arc<V>,
    initialized: bool,
}

impl<V: VectorStore> WaterWorksRAGEngine<V> {
    /// Create a new RAG engine over `vector_store`
    pub fn new(vector_store: Arc<V>) -> Self {
        Self {
            vector_store,
            initialized: false,
        }
    }

    fn share(budget: &RetrievalBudget, category: SourceCategory) -> usize {
        match category {
            SourceCategory::InternalDocs => budget.internal,
            SourceCategory::ProductDocs => budget.product,
            SourceCategory::Reviews => budget.reviews,
        }
    }

    /// Label shown next to a document in the context block
    fn describe(doc: &VectorDocument) -> String {
        let field = |key: &str| doc.metadata.get(key).and_then(|v| v.as_str());

        match doc.category {
            SourceCategory::Reviews => {
                let mut label = format!(
                    "{} {}",
                    field("sku").unwrap_or("unknown SKU"),
                    field("product_name").unwrap_or(wws_core::sku::UNKNOWN_PRODUCT)
                );
                if let Some(rating) = field("rating").filter(|r| !r.is_empty()) {
                    label.push_str(&format!(", rating {}", rating));
                }
                if let Some(date) = field("date").filter(|d| !d.is_empty()) {
                    label.push_str(&format!(", {}", date));
                }
                label
            }
            _ => field("filename").unwrap_or(&doc.id).to_string(),
        }
    }
}

#[async_trait]
impl<V: VectorStore + 'static> RAGEngine for WaterWorksRAGEngine<V> {
    async fn initialize(&mut self) -> Result<()> {
        if !self.vector_store.is_connected() {
            return Err(Error::RAGEngine("Vector store not connected".to_string()));
        }

        self.initialized = true;
        Ok(())
    }

    async fn retrieve(&self, question: &str) -> Result<RAGResult> {
        if !self.initialized {
            return Err(Error::RAGEngine("RAG engine not initialized".to_string()));
        }

        let budget = allocate(question);
        tracing::debug!(?budget, "retrieval budget");

        let mut documents = Vec::new();
        for category in SourceCategory::all() {
            let top_k = Self::share(&budget, category);
            if top_k == 0 {
                continue;
            }
            let config = SearchConfig::for_category(category, top_k);
            let result = self.vector_store.search(question, &config).await?;
            documents.extend(result.documents);
        }

        let sku = detect_sku(question);
        let mut supplementary_count = 0;
        if let Some(token) = &sku {
            let config = SearchConfig {
                top_k: SKU_SUPPLEMENT_LIMIT,
                ..Default::default()
            };
            let extra = self.vector_store.search(token, &config).await?;

            let mut seen: HashSet<String> = documents.iter().map(|d| d.id.clone()).collect();
            for doc in extra.documents {
                if supplementary_count == SKU_SUPPLEMENT_LIMIT {
                    break;
                }
                if seen.insert(doc.id.clone()) {
                    documents.push(doc);
                    supplementary_count += 1;
                }
            }
        }

        let context = self.build_context(&documents);

        Ok(RAGResult {
            documents,
            context,
            budget,
            sku,
            supplementary_count,
        })
    }

    fn build_context(&self, documents: &[VectorDocument]) -> String {
        documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                format!(
                    "{}. [{} | {}] {}",
                    i + 1,
                    doc.category.label(),
                    Self::describe(doc),
                    doc.content.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    async fn stats(&self) -> Result<serde_json::Value> {
        let mut by_category = serde_json::Map::new();
        for category in SourceCategory::all() {
            let count = self.vector_store.count_category(category).await?;
            by_category.insert(category.as_str().to_string(), json!(count));
        }

        Ok(json!({
            "initialized": self.initialized,
            "vector_store_count": self.vector_store.count().await?,
            "by_category": by_category,
        }))
    }

    fn is_ready(&self) -> bool {
        self.initialized && self.vector_store.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use crate::vector_store::LocalVectorStore;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use wws_core::SearchResult;

    /// Records every search call and answers from a fixed pool
    struct RecordingStore {
        pool: Vec<VectorDocument>,
        calls: Mutex<Vec<(String, SearchConfig)>>,
    }

    impl RecordingStore {
        fn new(pool: Vec<VectorDocument>) -> Self {
            Self {
                pool,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, SearchConfig)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn store_batch(&self, _documents: Vec<VectorDocument>) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn search(&self, query: &str, config: &SearchConfig) -> Result<SearchResult> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), config.clone()));
            let documents: Vec<VectorDocument> = self
                .pool
                .iter()
                .filter(|d| config.category.is_none_or(|c| d.category == c))
                .take(config.top_k)
                .cloned()
                .collect();
            let total = documents.len();
            Ok(SearchResult { documents, total })
        }

        async fn search_by_vector(
            &self,
            _vector: &[f32],
            _config: &SearchConfig,
        ) -> Result<SearchResult> {
            unreachable!("engine searches by text")
        }

        async fn contains(&self, id: &str) -> Result<bool> {
            Ok(self.pool.iter().any(|d| d.id == id))
        }

        async fn get(&self, id: &str) -> Result<Option<VectorDocument>> {
            Ok(self.pool.iter().find(|d| d.id == id).cloned())
        }

        async fn clear(&self) -> Result<()> {
            Ok(())
        }

        async fn count(&self) -> Result<usize> {
            Ok(self.pool.len())
        }

        async fn count_category(&self, category: SourceCategory) -> Result<usize> {
            Ok(self.pool.iter().filter(|d| d.category == category).count())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    fn pool_doc(id: &str, category: SourceCategory) -> VectorDocument {
        VectorDocument {
            id: id.to_string(),
            content: format!("content of {}", id),
            category,
            embedding: None,
            metadata: json!({"source": category.as_str(), "filename": format!("{}.pdf", id)}),
            score: None,
        }
    }

    fn pool() -> Vec<VectorDocument> {
        let mut docs = Vec::new();
        for i in 0..8 {
            docs.push(pool_doc(&format!("r{}", i), SourceCategory::Reviews));
            docs.push(pool_doc(&format!("p{}", i), SourceCategory::ProductDocs));
            docs.push(pool_doc(&format!("i{}", i), SourceCategory::InternalDocs));
        }
        docs
    }

    async fn engine(store: Arc<RecordingStore>) -> WaterWorksRAGEngine<RecordingStore> {
        let mut engine = WaterWorksRAGEngine::new(store);
        engine.initialize().await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_balanced_question_searches_each_category() {
        let store = Arc::new(RecordingStore::new(pool()));
        let engine = engine(store.clone()).await;

        let result = engine.retrieve("hello").await.unwrap();
        assert_eq!(result.budget, RetrievalBudget::new(5, 5, 5));
        assert_eq!(result.documents.len(), 15);
        assert_eq!(result.sku, None);

        let calls = store.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].1.category, Some(SourceCategory::InternalDocs));
        assert_eq!(calls[1].1.category, Some(SourceCategory::ProductDocs));
        assert_eq!(calls[2].1.category, Some(SourceCategory::Reviews));
    }

    #[tokio::test]
    async fn test_zero_share_categories_are_not_searched() {
        let store = Arc::new(RecordingStore::new(pool()));
        let engine = engine(store.clone()).await;

        let result = engine.retrieve("valve warranty").await.unwrap();
        assert_eq!(result.budget, RetrievalBudget::new(0, 20, 0));
        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.category, Some(SourceCategory::ProductDocs));
        assert!(result
            .documents
            .iter()
            .all(|d| d.category == SourceCategory::ProductDocs));
    }

    #[tokio::test]
    async fn test_sku_question_triggers_one_supplementary_search() {
        let store = Arc::new(RecordingStore::new(pool()));
        let engine = engine(store.clone()).await;

        let result = engine.retrieve("customer reviews of SKU-3").await.unwrap();
        assert_eq!(result.sku.as_deref(), Some("SKU-3"));

        let calls = store.calls();
        let supplementary: Vec<_> = calls.iter().filter(|(q, _)| q == "SKU-3").collect();
        assert_eq!(supplementary.len(), 1);
        assert_eq!(supplementary[0].1.top_k, SKU_SUPPLEMENT_LIMIT);
        assert_eq!(supplementary[0].1.category, None);

        // "sku" counts as a product keyword, so both categories are searched
        assert_eq!(result.budget, RetrievalBudget::new(0, 6, 13));
        assert!(result.supplementary_count <= SKU_SUPPLEMENT_LIMIT);
        let base = result.budget.product.min(8) + result.budget.reviews.min(8);
        assert_eq!(result.documents.len(), base + result.supplementary_count);
    }

    #[tokio::test]
    async fn test_supplementary_results_are_deduplicated() {
        // pool order makes the unfiltered top 3 r0, p0, i0; r0 and p0 are
        // already among the category results
        let store = Arc::new(RecordingStore::new(pool()));
        let engine = engine(store.clone()).await;

        let result = engine.retrieve("SKU-3 reviews").await.unwrap();
        let ids: Vec<&str> = result.documents.iter().map(|d| d.id.as_str()).collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(result.supplementary_count, 1);
        assert_eq!(ids.last(), Some(&"i0"));
    }

    #[tokio::test]
    async fn test_retrieve_before_initialize_fails() {
        let store = Arc::new(RecordingStore::new(pool()));
        let engine = WaterWorksRAGEngine::new(store);
        assert!(!engine.is_ready());
        assert!(engine.retrieve("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_build_context_labels() {
        let store = Arc::new(RecordingStore::new(Vec::new()));
        let engine = engine(store).await;

        let review = VectorDocument {
            id: "review_4".to_string(),
            content: "HydroMax Ultra (SKU-3) - Strong pressure".to_string(),
            category: SourceCategory::Reviews,
            embedding: None,
            metadata: json!({
                "sku": "SKU-3",
                "product_name": "HydroMax Ultra",
                "rating": "5",
                "date": "2024-04-01",
            }),
            score: Some(0.8),
        };
        let manual = pool_doc("p0", SourceCategory::ProductDocs);

        let context = engine.build_context(&[manual, review]);
        assert_eq!(
            context,
            "1. [Product | p0.pdf] content of p0\n\n\
             2. [Review | SKU-3 HydroMax Ultra, rating 5, 2024-04-01] HydroMax Ultra (SKU-3) - Strong pressure"
        );
        assert_eq!(engine.build_context(&[]), "");
    }

    #[tokio::test]
    async fn test_end_to_end_with_local_store() {
        let tmp = TempDir::new().unwrap();
        let mut store = LocalVectorStore::new(
            tmp.path().join("index"),
            Arc::new(HashEmbedder::default()),
        );
        store.connect().await.unwrap();
        store
            .store_batch(vec![
                VectorDocument::from(wws_core::Document::pdf_chunk(
                    SourceCategory::ProductDocs,
                    "clearwave.pdf",
                    0,
                    "ClearWave Filter cartridges last six months".to_string(),
                )),
                VectorDocument::from(wws_core::Document::pdf_chunk(
                    SourceCategory::InternalDocs,
                    "handbook.pdf",
                    0,
                    "Employees accrue vacation monthly".to_string(),
                )),
            ])
            .await
            .unwrap();

        let mut engine = WaterWorksRAGEngine::new(Arc::new(store));
        engine.initialize().await.unwrap();

        let result = engine.retrieve("How long does a filter cartridge last?").await.unwrap();
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].id, "product_docs_clearwave.pdf_0");
        assert!(result.context.contains("[Product | clearwave.pdf]"));

        let stats = engine.stats().await.unwrap();
        assert_eq!(stats["vector_store_count"], 2);
        assert_eq!(stats["by_category"]["internal_docs"], 1);
    }
}
