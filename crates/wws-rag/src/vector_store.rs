//! Persisted local vector store
//!
//! The index directory holds a LanceDB database with a single `documents`
//! table plus `manifest.json`. Presence of a complete index means "already
//! ingested". A directory whose manifest or table cannot be read, or whose
//! manifest names a different embedding model, is deleted and re-created
//! empty.

use arrow_array::types::Float32Type;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table, connect};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use wws_core::{
    Embedder, Error, Result, SearchConfig, SearchResult, SourceCategory, VectorDocument,
    VectorStore,
};

const MANIFEST_FILE: &str = "manifest.json";
const TABLE_NAME: &str = "documents";
const VECTOR_COLUMN: &str = "vector";
const INDEX_VERSION: u32 = 2;

/// Metadata written next to the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    pub embedding_model: String,
    pub embedding_dimension: Option<usize>,
    pub created_at: String,
    pub updated_at: String,
    pub document_count: usize,
    /// Set once an ingestion pass stored everything it loaded
    #[serde(default)]
    pub ingested: bool,
}

impl IndexManifest {
    fn new(embedding_model: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            version: INDEX_VERSION,
            embedding_model: embedding_model.to_string(),
            embedding_dimension: None,
            created_at: now.clone(),
            updated_at: now,
            document_count: 0,
            ingested: false,
        }
    }

    fn load(dir: &Path) -> Result<Self> {
        let content = fs::read_to_string(dir.join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// How the index directory was found when the store was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    /// Not opened yet
    Closed,
    /// Directory did not exist and was created
    Created,
    /// Directory existed but was corrupt; it was wiped and re-created
    Rebuilt,
    /// Directory existed and loaded cleanly
    Loaded,
}

struct StoreState {
    db: Option<Connection>,
    /// Created with the first write, once the embedding dimension is known
    table: Option<Table>,
    manifest: IndexManifest,
}

/// Vector store backed by an embedded LanceDB database in a local directory
pub struct LocalVectorStore<E: Embedder> {
    index_dir: PathBuf,
    embedder: Arc<E>,
    state: RwLock<StoreState>,
    index_state: IndexState,
}

fn store_error(e: impl std::fmt::Display) -> Error {
    Error::VectorStore(e.to_string())
}

fn quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn document_schema(dimension: usize) -> Result<SchemaRef> {
    let size = i32::try_from(dimension)
        .map_err(|_| Error::VectorStore(format!("Embedding dimension {} is too large", dimension)))?;
    Ok(Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), size),
            true,
        ),
    ])))
}

fn vector_dimension(schema: &Schema) -> Option<usize> {
    match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
        DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
        _ => None,
    }
}

fn to_record_batch(documents: &[VectorDocument], dimension: usize) -> Result<RecordBatch> {
    let schema = document_schema(dimension)?;
    let size = i32::try_from(dimension).map_err(store_error)?;

    let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
    let sources: Vec<&str> = documents.iter().map(|d| d.category.as_str()).collect();
    let contents: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
    let metadata = documents
        .iter()
        .map(|d| serde_json::to_string(&d.metadata))
        .collect::<std::result::Result<Vec<String>, _>>()?;
    let vectors = documents.iter().map(|d| {
        d.embedding
            .as_ref()
            .map(|v| v.iter().copied().map(Some).collect::<Vec<_>>())
    });

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(metadata)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
                vectors, size,
            )),
        ],
    )
    .map_err(store_error)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::VectorStore(format!("Column {} missing from results", name)))
}

/// Decode result rows. `_distance` is present on vector searches only.
fn documents_from_batch(batch: &RecordBatch) -> Result<Vec<VectorDocument>> {
    let ids = string_column(batch, "id")?;
    let sources = string_column(batch, "source")?;
    let contents = string_column(batch, "content")?;
    let metadata = string_column(batch, "metadata")?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    let mut documents = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let source = sources.value(row);
        let category = SourceCategory::from_name(source)
            .ok_or_else(|| Error::VectorStore(format!("Unknown source {}", source)))?;
        documents.push(VectorDocument {
            id: ids.value(row).to_string(),
            content: contents.value(row).to_string(),
            category,
            embedding: None,
            metadata: serde_json::from_str(metadata.value(row))?,
            score: distances.map(|d| 1.0 - d.value(row)),
        });
    }
    Ok(documents)
}

async fn existing_ids(table: &Table, documents: &[VectorDocument]) -> Result<HashSet<String>> {
    let list = documents
        .iter()
        .map(|d| quoted(&d.id))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stream = table
        .query()
        .only_if(format!("id IN ({})", list))
        .limit(documents.len())
        .execute()
        .await
        .map_err(store_error)?;

    let mut ids = HashSet::new();
    while let Some(batch) = stream.try_next().await.map_err(store_error)? {
        let column = string_column(&batch, "id")?;
        for row in 0..batch.num_rows() {
            ids.insert(column.value(row).to_string());
        }
    }
    Ok(ids)
}

/// Wipe `index_dir` and open an empty database in its place
async fn fresh_state(index_dir: &Path, embedding_model: &str) -> Result<StoreState> {
    if index_dir.exists() {
        fs::remove_dir_all(index_dir)?;
    }
    fs::create_dir_all(index_dir)?;

    let db = connect(&index_dir.to_string_lossy())
        .execute()
        .await
        .map_err(store_error)?;
    let manifest = IndexManifest::new(embedding_model);
    manifest.save(index_dir)?;

    Ok(StoreState {
        db: Some(db),
        table: None,
        manifest,
    })
}

impl<E: Embedder> LocalVectorStore<E> {
    /// Create a new store rooted at `index_dir`. Nothing touches the disk
    /// until `connect`.
    pub fn new(index_dir: impl Into<PathBuf>, embedder: Arc<E>) -> Self {
        let manifest = IndexManifest::new(embedder.model_name());
        Self {
            index_dir: index_dir.into(),
            embedder,
            state: RwLock::new(StoreState {
                db: None,
                table: None,
                manifest,
            }),
            index_state: IndexState::Closed,
        }
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    pub fn index_state(&self) -> IndexState {
        self.index_state
    }

    /// Whether an index has been written at `index_dir`. Does not touch the
    /// disk beyond a metadata lookup.
    pub fn index_exists(&self) -> bool {
        self.index_dir.join(MANIFEST_FILE).is_file()
    }

    /// True until an ingestion pass has stored at least one document and
    /// completed without write failures
    pub async fn needs_ingestion(&self) -> bool {
        let state = self.state.read().await;
        !state.manifest.ingested || state.manifest.document_count == 0
    }

    /// Snapshot of the manifest
    pub async fn manifest(&self) -> IndexManifest {
        self.state.read().await.manifest.clone()
    }

    /// Delete the index directory and start over empty
    pub async fn rebuild(&mut self) -> Result<()> {
        let state = fresh_state(&self.index_dir, self.embedder.model_name()).await?;
        *self.state.get_mut() = state;
        self.index_state = IndexState::Rebuilt;
        Ok(())
    }

    /// Open the database and check it against the manifest
    async fn load_from_dir(&self) -> Result<StoreState> {
        let manifest = IndexManifest::load(&self.index_dir)?;

        if manifest.version != INDEX_VERSION {
            return Err(Error::VectorStore(format!(
                "Unsupported index version {}",
                manifest.version
            )));
        }
        if manifest.embedding_model != self.embedder.model_name() {
            return Err(Error::VectorStore(format!(
                "Index was built with embedding model {}, current model is {}",
                manifest.embedding_model,
                self.embedder.model_name()
            )));
        }

        let db = connect(&self.index_dir.to_string_lossy())
            .execute()
            .await
            .map_err(store_error)?;
        let names = db.table_names().execute().await.map_err(store_error)?;
        let table = if names.iter().any(|name| name == TABLE_NAME) {
            Some(db.open_table(TABLE_NAME).execute().await.map_err(store_error)?)
        } else {
            None
        };

        let (rows, dimension) = match &table {
            Some(table) => {
                let schema = table.schema().await.map_err(store_error)?;
                let rows = table.count_rows(None).await.map_err(store_error)?;
                (rows, vector_dimension(&schema))
            }
            None => (0, manifest.embedding_dimension),
        };

        if dimension != manifest.embedding_dimension {
            return Err(Error::VectorStore(format!(
                "Table vectors have dimension {:?}, manifest says {:?}",
                dimension, manifest.embedding_dimension
            )));
        }
        if rows != manifest.document_count {
            return Err(Error::VectorStore(format!(
                "Manifest lists {} documents, table holds {}",
                manifest.document_count, rows
            )));
        }

        Ok(StoreState {
            db: Some(db),
            table,
            manifest,
        })
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.index_state == IndexState::Closed {
            return Err(Error::VectorStore("Vector store not connected".to_string()));
        }
        Ok(())
    }

    async fn table(&self) -> Result<Option<Table>> {
        self.ensure_connected()?;
        Ok(self.state.read().await.table.clone())
    }

    async fn count_where(&self, filter: Option<String>) -> Result<usize> {
        match self.table().await? {
            Some(table) => table.count_rows(filter).await.map_err(store_error),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl<E: Embedder + 'static> VectorStore for LocalVectorStore<E> {
    async fn connect(&mut self) -> Result<()> {
        if !self.index_dir.exists() {
            tracing::info!(dir = %self.index_dir.display(), "creating vector index");
            let state = fresh_state(&self.index_dir, self.embedder.model_name()).await?;
            *self.state.get_mut() = state;
            self.index_state = IndexState::Created;
            return Ok(());
        }

        match self.load_from_dir().await {
            Ok(loaded) => {
                tracing::info!(
                    dir = %self.index_dir.display(),
                    documents = loaded.manifest.document_count,
                    ingested = loaded.manifest.ingested,
                    "loaded vector index"
                );
                *self.state.get_mut() = loaded;
                self.index_state = IndexState::Loaded;
            }
            Err(e) => {
                tracing::warn!(
                    dir = %self.index_dir.display(),
                    error = %e,
                    "vector index is unreadable, rebuilding"
                );
                self.rebuild().await?;
            }
        }

        Ok(())
    }

    async fn store_batch(&self, documents: Vec<VectorDocument>) -> Result<Vec<String>> {
        self.ensure_connected()?;
        let mut state = self.state.write().await;

        let mut seen = HashSet::new();
        let candidates: Vec<VectorDocument> = documents
            .into_iter()
            .filter(|doc| seen.insert(doc.id.clone()))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let existing = match state.table.clone() {
            Some(table) => existing_ids(&table, &candidates).await?,
            None => HashSet::new(),
        };
        let pending: Vec<VectorDocument> = candidates
            .into_iter()
            .filter(|doc| !existing.contains(&doc.id))
            .collect();
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let missing: Vec<String> = pending
            .iter()
            .filter(|doc| doc.embedding.is_none())
            .map(|doc| doc.content.clone())
            .collect();
        let mut computed = if missing.is_empty() {
            Vec::new().into_iter()
        } else {
            self.embedder.embed_batch(&missing).await?.into_iter()
        };

        let mut dimension = state.manifest.embedding_dimension;
        let mut prepared = Vec::with_capacity(pending.len());
        for mut doc in pending {
            if doc.embedding.is_none() {
                doc.embedding = Some(computed.next().ok_or_else(|| {
                    Error::Embedding("Embedder returned fewer vectors than inputs".to_string())
                })?);
            }
            let len = doc.embedding.as_ref().map_or(0, Vec::len);
            match dimension {
                Some(expected) if expected != len => {
                    return Err(Error::VectorStore(format!(
                        "Embedding dimension mismatch for {}: expected {}, got {}",
                        doc.id, expected, len
                    )));
                }
                None => dimension = Some(len),
                _ => {}
            }
            prepared.push(doc);
        }
        let dimension = dimension.unwrap_or_default();

        let batch = to_record_batch(&prepared, dimension)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));

        let table = if let Some(table) = state.table.clone() {
            table.add(reader).execute().await.map_err(store_error)?;
            table
        } else {
            let db = state
                .db
                .clone()
                .ok_or_else(|| Error::VectorStore("Vector store not connected".to_string()))?;
            db.create_table(TABLE_NAME, reader)
                .execute()
                .await
                .map_err(store_error)?
        };

        state.manifest.embedding_dimension = Some(dimension);
        state.manifest.document_count = table.count_rows(None).await.map_err(store_error)?;
        state.manifest.updated_at = Utc::now().to_rfc3339();
        state.manifest.save(&self.index_dir)?;
        state.table = Some(table);

        Ok(prepared.into_iter().map(|doc| doc.id).collect())
    }

    async fn search(&self, query: &str, config: &SearchConfig) -> Result<SearchResult> {
        self.ensure_connected()?;
        let vector = self.embedder.embed(query).await?;
        self.search_by_vector(&vector, config).await
    }

    async fn search_by_vector(&self, vector: &[f32], config: &SearchConfig) -> Result<SearchResult> {
        let Some(table) = self.table().await? else {
            return Ok(SearchResult {
                documents: Vec::new(),
                total: 0,
            });
        };

        let mut query = table
            .vector_search(vector.to_vec())
            .map_err(store_error)?
            .column(VECTOR_COLUMN)
            .distance_type(DistanceType::Cosine)
            .limit(config.top_k);
        if let Some(category) = config.category {
            query = query.only_if(format!("source = {}", quoted(category.as_str())));
        }

        let mut stream = query.execute().await.map_err(store_error)?;
        let mut results = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(store_error)? {
            results.extend(documents_from_batch(&batch)?);
        }

        results.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .partial_cmp(&a.score.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(config.top_k);

        let total = results.len();
        Ok(SearchResult {
            documents: results,
            total,
        })
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.count_where(Some(format!("id = {}", quoted(id)))).await? > 0)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorDocument>> {
        let Some(table) = self.table().await? else {
            return Ok(None);
        };

        let mut stream = table
            .query()
            .only_if(format!("id = {}", quoted(id)))
            .limit(1)
            .execute()
            .await
            .map_err(store_error)?;
        while let Some(batch) = stream.try_next().await.map_err(store_error)? {
            if let Some(doc) = documents_from_batch(&batch)?.into_iter().next() {
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    async fn clear(&self) -> Result<()> {
        self.ensure_connected()?;
        let mut state = self.state.write().await;
        *state = fresh_state(&self.index_dir, self.embedder.model_name()).await?;
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        self.count_where(None).await
    }

    async fn count_category(&self, category: SourceCategory) -> Result<usize> {
        self.count_where(Some(format!("source = {}", quoted(category.as_str()))))
            .await
    }

    async fn finish_ingestion(&self) -> Result<()> {
        self.ensure_connected()?;
        let mut state = self.state.write().await;
        state.manifest.ingested = true;
        state.manifest.updated_at = Utc::now().to_rfc3339();
        state.manifest.save(&self.index_dir)
    }

    fn is_connected(&self) -> bool {
        self.index_state != IndexState::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(id: &str, category: SourceCategory, content: &str) -> VectorDocument {
        VectorDocument {
            id: id.to_string(),
            content: content.to_string(),
            category,
            embedding: None,
            metadata: json!({"source": category.as_str()}),
            score: None,
        }
    }

    async fn open(dir: &Path) -> LocalVectorStore<HashEmbedder> {
        let mut store = LocalVectorStore::new(dir, Arc::new(HashEmbedder::default()));
        store.connect().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_connect_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        let store = LocalVectorStore::new(&dir, Arc::new(HashEmbedder::default()));
        assert!(!store.index_exists());

        let store = open(&dir).await;
        assert_eq!(store.index_state(), IndexState::Created);
        assert!(store.index_exists());
        assert!(store.needs_ingestion().await);
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.search("anything", &SearchConfig::default()).await.unwrap().documents.is_empty());
    }

    #[tokio::test]
    async fn test_reopening_an_empty_index_still_needs_ingestion() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        drop(open(&dir).await);

        let store = open(&dir).await;
        assert_eq!(store.index_state(), IndexState::Loaded);
        assert!(store.needs_ingestion().await);
    }

    #[tokio::test]
    async fn test_unfinished_ingestion_is_resumed_on_reopen() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        {
            let store = open(&dir).await;
            store
                .store_batch(vec![doc("a", SourceCategory::Reviews, "text")])
                .await
                .unwrap();
        }

        let store = open(&dir).await;
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.needs_ingestion().await);

        store.finish_ingestion().await.unwrap();
        drop(store);
        let store = open(&dir).await;
        assert!(!store.needs_ingestion().await);
        assert!(store.manifest().await.ingested);
    }

    #[tokio::test]
    async fn test_store_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        {
            let store = open(&dir).await;
            let ids = store
                .store_batch(vec![
                    doc("a", SourceCategory::ProductDocs, "valve pressure rating"),
                    doc("b", SourceCategory::Reviews, "great faucet"),
                ])
                .await
                .unwrap();
            assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        }

        let store = open(&dir).await;
        assert_eq!(store.index_state(), IndexState::Loaded);
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.count_category(SourceCategory::Reviews).await.unwrap(), 1);
        assert_eq!(
            store.manifest().await.embedding_dimension,
            Some(crate::embedder::DEFAULT_DIMENSION)
        );
    }

    #[tokio::test]
    async fn test_existing_ids_are_not_rewritten() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp.path().join("index")).await;

        store
            .store_batch(vec![doc("a", SourceCategory::ProductDocs, "original")])
            .await
            .unwrap();
        let written = store
            .store_batch(vec![
                doc("a", SourceCategory::ProductDocs, "replacement"),
                doc("c", SourceCategory::ProductDocs, "new"),
                doc("c", SourceCategory::ProductDocs, "duplicate in batch"),
            ])
            .await
            .unwrap();

        assert_eq!(written, vec!["c".to_string()]);
        assert_eq!(store.count().await.unwrap(), 2);
        let a = store.get("a").await.unwrap().unwrap();
        assert_eq!(a.content, "original");
        assert_eq!(a.metadata["source"], "product_docs");
        assert_eq!(store.get("c").await.unwrap().unwrap().content, "new");
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_with_quotes_are_escaped() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp.path().join("index")).await;
        store
            .store_batch(vec![doc("product_docs_O'Brien manual.pdf_0", SourceCategory::ProductDocs, "text")])
            .await
            .unwrap();
        assert!(store.contains("product_docs_O'Brien manual.pdf_0").await.unwrap());
        assert!(!store.contains("product_docs_O").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_rebuilt() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        {
            let store = open(&dir).await;
            store
                .store_batch(vec![doc("a", SourceCategory::ProductDocs, "text")])
                .await
                .unwrap();
        }
        fs::write(dir.join(MANIFEST_FILE), "{ not json").unwrap();

        let store = open(&dir).await;
        assert_eq!(store.index_state(), IndexState::Rebuilt);
        assert!(store.needs_ingestion().await);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_table_is_rebuilt() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        {
            let store = open(&dir).await;
            store
                .store_batch(vec![doc("a", SourceCategory::ProductDocs, "text")])
                .await
                .unwrap();
        }
        fs::remove_dir_all(dir.join(format!("{}.lance", TABLE_NAME))).unwrap();

        let store = open(&dir).await;
        assert_eq!(store.index_state(), IndexState::Rebuilt);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_model_change_triggers_rebuild() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        {
            let store = open(&dir).await;
            store
                .store_batch(vec![doc("a", SourceCategory::ProductDocs, "text")])
                .await
                .unwrap();
        }

        let mut store = LocalVectorStore::new(&dir, Arc::new(HashEmbedder::new(64)));
        store.connect().await.unwrap();
        assert_eq!(store.index_state(), IndexState::Rebuilt);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_filters_by_category() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp.path().join("index")).await;
        store
            .store_batch(vec![
                doc("p1", SourceCategory::ProductDocs, "ClearWave filter cartridge replacement"),
                doc("r1", SourceCategory::Reviews, "ClearWave filter cartridge was easy"),
                doc("i1", SourceCategory::InternalDocs, "vacation policy for staff"),
            ])
            .await
            .unwrap();

        let config = SearchConfig::for_category(SourceCategory::ProductDocs, 5);
        let result = store.search("filter cartridge", &config).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.documents[0].id, "p1");
        assert!(result.documents[0].embedding.is_none());
        assert!(result.documents[0].score.unwrap() > 0.0);

        let all = store
            .search("filter cartridge", &SearchConfig { top_k: 2, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        assert!(all.documents.iter().all(|d| d.id != "i1"));
    }

    #[tokio::test]
    async fn test_store_before_connect_fails() {
        let tmp = TempDir::new().unwrap();
        let store = LocalVectorStore::new(tmp.path().join("index"), Arc::new(HashEmbedder::default()));
        assert!(!store.is_connected());
        assert!(store.store_batch(vec![]).await.is_err());
        assert!(!tmp.path().join("index").exists());
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("index");
        let store = open(&dir).await;
        store
            .store_batch(vec![doc("a", SourceCategory::Reviews, "text")])
            .await
            .unwrap();
        store.finish_ingestion().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.needs_ingestion().await);
        assert!(dir.join(MANIFEST_FILE).exists());
    }
}
