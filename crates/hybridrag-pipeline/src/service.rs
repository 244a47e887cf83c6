use hybridrag_chunking::{
    merge_metadata, ChunkerRegistry, ChunkingOptions, DocumentType, DocumentTypeDetector,
    KeywordExtractor,
};
use hybridrag_core::{
    AddReport, Chunk, ClearReport, Document, Embedding, Metadata, RagConfig, RagError, RagResult,
    ScoredResult, SearchParams, SearchResult, SearchStats, StoreStatistics,
};
use hybridrag_memory::{EmbeddingProvider, HybridVectorStore};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Application-facing entry point: chunking, indexing and hybrid search.
///
/// Collaborators are injected once at construction; the service holds no
/// global state.
pub struct RetrievalService {
    detector: DocumentTypeDetector,
    registry: Arc<ChunkerRegistry>,
    store: Arc<HybridVectorStore>,
    options: ChunkingOptions,
    defaults: SearchParams,
}

impl RetrievalService {
    /// Wire a service from its parts. Chunking options are validated here.
    pub fn new(
        registry: Arc<ChunkerRegistry>,
        store: Arc<HybridVectorStore>,
        options: ChunkingOptions,
        defaults: SearchParams,
    ) -> RagResult<Self> {
        options.validate()?;
        defaults.validate()?;
        Ok(Self {
            detector: DocumentTypeDetector::new(),
            registry,
            store,
            options,
            defaults,
        })
    }

    /// Build the whole stack from configuration around an embedding provider.
    pub fn from_config(config: &RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> RagResult<Self> {
        config.validate()?;
        let keywords = Arc::new(KeywordExtractor::new(&config.keywords.terms)?);
        let registry = ChunkerRegistry::with_builtin_strategies(&config.chunking, keywords)?;
        let store = HybridVectorStore::from_config(config, embedder);
        Self::new(
            Arc::new(registry),
            Arc::new(store),
            ChunkingOptions::from(&config.chunking),
            SearchParams::from(&config.search),
        )
    }

    /// Search parameters used by [`RetrievalService::search_default`].
    pub fn default_params(&self) -> SearchParams {
        self.defaults
    }

    /// Prepare the embedding backend and index any restored chunks.
    pub async fn initialize(&self) -> RagResult<usize> {
        self.store.initialize().await
    }

    /// Split a document with the strategy its metadata selects.
    ///
    /// Explicit `metadata` takes precedence over the document's own. If a
    /// non-default strategy fails, or produces nothing for non-blank content,
    /// the default splitter is used instead.
    pub fn chunk_document(
        &self,
        document: &Document,
        metadata: Option<&Metadata>,
    ) -> RagResult<Vec<Chunk>> {
        let merged = merge_metadata(document, metadata);
        let tag = self.detector.detect(Some(&merged), &document.content);

        let attempt = self
            .registry
            .create(&tag, &self.options)
            .and_then(|chunker| chunker.chunk(document, metadata));

        if tag == DocumentType::Unknown {
            return attempt;
        }
        match attempt {
            Ok(chunks) if !chunks.is_empty() || document.content.trim().is_empty() => Ok(chunks),
            Ok(_) => {
                warn!(document = %document.id, tag = %tag, "Strategy produced no chunks, using default");
                self.chunk_with_default(document, metadata)
            }
            Err(e) => {
                warn!(document = %document.id, tag = %tag, error = %e, "Strategy failed, using default");
                self.chunk_with_default(document, metadata)
            }
        }
    }

    fn chunk_with_default(
        &self,
        document: &Document,
        metadata: Option<&Metadata>,
    ) -> RagResult<Vec<Chunk>> {
        self.registry
            .create_default(&self.options)?
            .chunk(document, metadata)
    }

    /// Add pre-chunked, pre-embedded content of one document.
    pub async fn add_document(
        &self,
        document: &Document,
        chunks: Vec<Chunk>,
        embeddings: Vec<Embedding>,
    ) -> RagResult<AddReport> {
        if let Some(foreign) = chunks.iter().find(|c| c.document_id != document.id) {
            return Err(RagError::validation(format!(
                "Chunk {} belongs to document {}, not {}",
                foreign.id, foreign.document_id, document.id
            )));
        }
        self.store.add_batch(chunks, embeddings).await
    }

    /// Chunk, embed and index a document in one call.
    pub async fn ingest(
        &self,
        document: &Document,
        metadata: Option<&Metadata>,
    ) -> RagResult<AddReport> {
        let chunks = self.chunk_document(document, metadata)?;
        let count = chunks.len();
        let report = self.store.index_chunks(chunks).await?;
        info!(
            document = %document.id,
            source = %document.source,
            chunks = count,
            total = report.total_chunks,
            "Ingested document"
        );
        Ok(report)
    }

    pub async fn search(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> RagResult<(Vec<SearchResult>, SearchStats)> {
        self.store.search(query, params).await
    }

    /// Search with the configured defaults.
    pub async fn search_default(
        &self,
        query: &str,
    ) -> RagResult<(Vec<SearchResult>, SearchStats)> {
        self.store.search(query, &self.defaults).await
    }

    pub async fn search_detailed(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> RagResult<(Vec<ScoredResult>, SearchStats)> {
        self.store.search_detailed(query, params).await
    }

    pub async fn get_statistics(&self) -> StoreStatistics {
        self.store.statistics().await
    }

    pub async fn delete_document(&self, document_id: Uuid) -> usize {
        self.store.delete_document(document_id).await
    }

    pub async fn clear(&self) -> ClearReport {
        self.store.clear().await
    }
}
