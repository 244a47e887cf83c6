use crate::bm25::{normalize_by_max, Bm25Index, Bm25Params};
use crate::embedding::EmbeddingProvider;
use crate::matrix::DenseMatrix;
use crate::tokenizer::{SimpleTokenizer, Tokenizer};
use hybridrag_core::{
    AddReport, Chunk, ClearReport, DegradedMode, Embedding, RagConfig, RagError, RagResult,
    ScoredResult, SearchParams, SearchResult, SearchStats, StoreStatistics,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An indexed chunk with its embedding and cached lexical tokens.
#[derive(Debug, Clone)]
struct Entry {
    chunk: Arc<Chunk>,
    embedding: Embedding,
    tokens: Vec<String>,
}

/// Everything a search reads. Guarded by one lock so that the chunk
/// sequence, matrix rows and lexical document count always agree.
#[derive(Debug, Default)]
struct IndexState {
    entries: Vec<Entry>,
    matrix: Option<DenseMatrix>,
    lexical: Option<Bm25Index>,
    dimension: Option<usize>,
    /// Restored chunks waiting for `initialize` to embed them.
    pending: Vec<Chunk>,
}

impl IndexState {
    fn contains(&self, id: &Uuid) -> bool {
        self.entries.iter().any(|e| e.chunk.id == *id) || self.pending.iter().any(|c| c.id == *id)
    }

    fn document_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.chunk.document_id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Recompute the dense matrix and lexical index from `entries`.
    fn rebuild(&mut self, params: Bm25Params) {
        let Some(first) = self.entries.first() else {
            self.matrix = None;
            self.lexical = None;
            self.dimension = None;
            return;
        };
        let dimension = first.embedding.dimension();
        self.matrix = Some(DenseMatrix::from_rows(
            dimension,
            self.entries.iter().map(|e| e.embedding.vector.as_slice()),
        ));
        let lexical = Bm25Index::build(params, self.entries.iter().map(|e| e.tokens.as_slice()));
        debug!(
            chunks = self.entries.len(),
            terms = lexical.term_count(),
            dimension,
            "Rebuilt dense and lexical indexes"
        );
        self.lexical = Some(lexical);
        self.dimension = Some(dimension);
    }

    /// Drop indexed and pending chunks matching `predicate`. Returns how many
    /// were dropped in total.
    fn remove_where(&mut self, params: Bm25Params, predicate: impl Fn(&Chunk) -> bool) -> usize {
        let before_entries = self.entries.len();
        let before_pending = self.pending.len();
        self.entries.retain(|e| !predicate(e.chunk.as_ref()));
        self.pending.retain(|c| !predicate(c));
        let removed = before_entries - self.entries.len();
        if removed > 0 {
            self.rebuild(params);
        }
        removed + before_pending - self.pending.len()
    }
}

/// In-memory hybrid store ranking chunks by a blend of cosine similarity and
/// max-normalized BM25.
///
/// ```text
/// hybrid[i] = w * dense[i] + (1 - w) * lexical[i]
/// ```
///
/// Searches share a read lock; mutations take the write lock for the whole
/// rebuild. Embedding calls happen before any lock is taken.
pub struct HybridVectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    tokenizer: Arc<dyn Tokenizer>,
    bm25: Bm25Params,
    degraded_mode: DegradedMode,
    state: RwLock<IndexState>,
}

impl HybridVectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            embedder,
            tokenizer,
            bm25: Bm25Params::default(),
            degraded_mode: DegradedMode::default(),
            state: RwLock::new(IndexState::default()),
        }
    }

    /// A store using the lexical and degraded-mode settings of `config`.
    pub fn from_config(config: &RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(
            embedder,
            Arc::new(SimpleTokenizer::from_flag(config.lexical.remove_stopwords)),
        )
        .with_bm25_params(Bm25Params::from(&config.lexical))
        .with_degraded_mode(config.search.degraded_mode)
    }

    pub fn with_bm25_params(mut self, params: Bm25Params) -> Self {
        self.bm25 = params;
        self
    }

    pub fn with_degraded_mode(mut self, mode: DegradedMode) -> Self {
        self.degraded_mode = mode;
        self
    }

    /// Number of indexed chunks.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Established embedding dimension, if any chunk is indexed.
    pub async fn dimension(&self) -> Option<usize> {
        self.state.read().await.dimension
    }

    /// Chunks restored but not yet embedded.
    pub async fn pending_count(&self) -> usize {
        self.state.read().await.pending.len()
    }

    /// Seed chunks from an external snapshot. They become searchable after
    /// [`HybridVectorStore::initialize`].
    pub async fn restore(&self, chunks: Vec<Chunk>) -> RagResult<usize> {
        let mut state = self.state.write().await;
        let mut seen = HashSet::new();
        for chunk in &chunks {
            if !seen.insert(chunk.id) || state.contains(&chunk.id) {
                return Err(RagError::validation(format!(
                    "Duplicate chunk id {} in restored state",
                    chunk.id
                )));
            }
        }
        state.pending.extend(chunks);
        debug!(pending = state.pending.len(), "Restored chunks awaiting embedding");
        Ok(state.pending.len())
    }

    /// Warm up the embedding backend and index any restored chunks.
    ///
    /// Returns the number of chunks indexed. Restored chunks stay pending
    /// while they are embedded, so a concurrent delete or clear still removes
    /// them and a concurrent restore of the same ids is rejected. On failure
    /// they remain pending.
    pub async fn initialize(&self) -> RagResult<usize> {
        self.ensure_available().await?;
        self.embedder.warm_up().await?;

        let snapshot = self.state.read().await.pending.clone();
        if snapshot.is_empty() {
            info!(model = self.embedder.model_name(), "Hybrid store initialized");
            return Ok(0);
        }

        let texts: Vec<&str> = snapshot.iter().map(|c| c.content.as_str()).collect();
        let vectors = self.embed_texts(&texts).await?;
        let model = self.embedder.model_name().to_string();

        let mut state = self.state.write().await;
        let still_pending: HashSet<Uuid> = state.pending.iter().map(|c| c.id).collect();
        let mut chunks = Vec::with_capacity(snapshot.len());
        let mut embeddings = Vec::with_capacity(snapshot.len());
        for (chunk, vector) in snapshot.into_iter().zip(vectors) {
            if still_pending.contains(&chunk.id) {
                embeddings.push(Embedding::new(chunk.id, vector, model.clone()));
                chunks.push(chunk);
            }
        }
        let tokens = self.tokenize_all(&chunks);

        let indexing: HashSet<Uuid> = chunks.iter().map(|c| c.id).collect();
        let (taken, rest): (Vec<Chunk>, Vec<Chunk>) = std::mem::take(&mut state.pending)
            .into_iter()
            .partition(|c| indexing.contains(&c.id));
        state.pending = rest;

        match self.insert(&mut state, chunks, embeddings, tokens) {
            Ok(report) => {
                info!(
                    indexed = report.added_chunks,
                    total = report.total_chunks,
                    "Hybrid store initialized from restored state"
                );
                Ok(report.added_chunks)
            }
            Err(e) => {
                let newer = std::mem::replace(&mut state.pending, taken);
                state.pending.extend(newer);
                Err(e)
            }
        }
    }

    /// Add one chunk with its embedding.
    pub async fn add(&self, chunk: Chunk, embedding: Embedding) -> RagResult<AddReport> {
        self.add_batch(vec![chunk], vec![embedding]).await
    }

    /// Add chunks with caller-supplied embeddings, then rebuild both indexes.
    ///
    /// The whole batch is validated before the store changes: counts must
    /// match, every embedding must belong to its chunk, have the store's
    /// dimension (or agree with the rest of the batch on an empty store) and
    /// contain only finite values, and no chunk id may already be present.
    pub async fn add_batch(
        &self,
        chunks: Vec<Chunk>,
        embeddings: Vec<Embedding>,
    ) -> RagResult<AddReport> {
        if self.degraded_mode == DegradedMode::Fail {
            self.ensure_available().await?;
        }
        if chunks.len() != embeddings.len() {
            return Err(RagError::validation(format!(
                "Got {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let tokens = self.tokenize_all(&chunks);
        let mut state = self.state.write().await;
        self.insert(&mut state, chunks, embeddings, tokens)
    }

    fn tokenize_all(&self, chunks: &[Chunk]) -> Vec<Vec<String>> {
        chunks
            .iter()
            .map(|c| self.tokenizer.tokenize(&c.content))
            .collect()
    }

    /// Validate a batch against `state`, then append it and rebuild.
    fn insert(
        &self,
        state: &mut IndexState,
        chunks: Vec<Chunk>,
        embeddings: Vec<Embedding>,
        tokens: Vec<Vec<String>>,
    ) -> RagResult<AddReport> {
        let dimension = validate_batch(state, &chunks, &embeddings)?;

        if chunks.is_empty() {
            return Ok(AddReport {
                added_chunks: 0,
                total_chunks: state.entries.len(),
                dimension: state.dimension.unwrap_or(0),
            });
        }

        let added = chunks.len();
        state.entries.extend(
            chunks
                .into_iter()
                .zip(embeddings)
                .zip(tokens)
                .map(|((chunk, embedding), tokens)| Entry {
                    chunk: Arc::new(chunk),
                    embedding,
                    tokens,
                }),
        );
        state.rebuild(self.bm25);

        info!(
            added,
            total = state.entries.len(),
            dimension,
            "Added chunks to hybrid store"
        );
        Ok(AddReport {
            added_chunks: added,
            total_chunks: state.entries.len(),
            dimension,
        })
    }

    /// Embed chunks through the embedding port and add them.
    ///
    /// Texts go out in sub-batches of the provider's preferred size. Any
    /// failure aborts the call with the store unchanged.
    pub async fn index_chunks(&self, chunks: Vec<Chunk>) -> RagResult<AddReport> {
        self.ensure_available().await?;

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let vectors = self.embed_texts(&texts).await?;
        let model = self.embedder.model_name().to_string();
        let embeddings = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| Embedding::new(chunk.id, vector, model.clone()))
            .collect();

        self.add_batch(chunks, embeddings).await
    }

    /// Remove chunks by id. Returns how many were removed.
    pub async fn delete(&self, chunk_ids: &[Uuid]) -> usize {
        let ids: HashSet<Uuid> = chunk_ids.iter().copied().collect();
        let mut state = self.state.write().await;
        let removed = state.remove_where(self.bm25, |c| ids.contains(&c.id));
        info!(removed, remaining = state.entries.len(), "Deleted chunks");
        removed
    }

    /// Remove every chunk of one document.
    pub async fn delete_document(&self, document_id: Uuid) -> usize {
        let mut state = self.state.write().await;
        let removed = state.remove_where(self.bm25, |c| c.document_id == document_id);
        info!(document = %document_id, removed, "Deleted document chunks");
        removed
    }

    /// Drop all chunks and indexes. The embedding backend is left as is.
    pub async fn clear(&self) -> ClearReport {
        let mut state = self.state.write().await;
        let report = ClearReport {
            previous_documents: state.document_count(),
            previous_chunks: state.entries.len(),
        };
        *state = IndexState::default();
        info!(
            documents = report.previous_documents,
            chunks = report.previous_chunks,
            "Cleared hybrid store"
        );
        report
    }

    /// Ranked chunks for `query`.
    pub async fn search(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> RagResult<(Vec<SearchResult>, SearchStats)> {
        let (scored, stats) = self.search_detailed(query, params).await?;
        Ok((scored.into_iter().map(|s| s.result).collect(), stats))
    }

    /// Like [`HybridVectorStore::search`], also reporting the unweighted
    /// dense and lexical scores of each hit.
    pub async fn search_detailed(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> RagResult<(Vec<ScoredResult>, SearchStats)> {
        params.validate()?;
        if query.trim().is_empty() {
            return Err(RagError::validation("Query text must not be empty"));
        }

        let started = Instant::now();
        let mut stats = SearchStats::default();

        if self.state.read().await.entries.is_empty() {
            stats.total_ms = elapsed_ms(started);
            return Ok((Vec::new(), stats));
        }

        let query_vector = if self.embedder.is_available().await {
            Some(self.embedder.embed_single(query).await?)
        } else {
            match self.degraded_mode {
                DegradedMode::Fail => return Err(self.unavailable()),
                DegradedMode::LexicalOnly => {
                    warn!(
                        model = self.embedder.model_name(),
                        "Embedding backend unavailable, ranking on lexical scores only"
                    );
                    stats.degraded = true;
                    None
                }
            }
        };
        let query_tokens = self.tokenizer.tokenize(query);
        stats.embed_ms = elapsed_ms(started);

        let scoring_started = Instant::now();
        let state = self.state.read().await;
        let (Some(matrix), Some(lexical)) = (&state.matrix, &state.lexical) else {
            stats.total_ms = elapsed_ms(started);
            return Ok((Vec::new(), stats));
        };

        let dense = match &query_vector {
            Some(vector) => {
                if vector.len() != matrix.dimension() {
                    return Err(RagError::Embedding(format!(
                        "Query embedding has dimension {}, store expects {}",
                        vector.len(),
                        matrix.dimension()
                    )));
                }
                matrix.cosine_scores(vector)
            }
            None => vec![0.0; state.entries.len()],
        };
        let mut lexical_scores = lexical.scores(&query_tokens);
        normalize_by_max(&mut lexical_scores);

        let weight = if stats.degraded {
            0.0
        } else {
            params.hybrid_weight
        };
        let hybrid: Vec<f32> = dense
            .iter()
            .zip(&lexical_scores)
            .map(|(d, l)| weight * d + (1.0 - weight) * l)
            .collect();

        let mut kept: Vec<usize> = (0..hybrid.len())
            .filter(|&i| hybrid[i] >= params.similarity_threshold)
            .collect();
        stats.candidates = hybrid.len();
        stats.above_threshold = kept.len();

        // Stable: equal scores keep insertion order.
        kept.sort_by(|&a, &b| hybrid[b].total_cmp(&hybrid[a]));
        kept.truncate(params.top_k);

        let results: Vec<ScoredResult> = kept
            .into_iter()
            .enumerate()
            .map(|(position, i)| ScoredResult {
                result: SearchResult {
                    chunk: Arc::clone(&state.entries[i].chunk),
                    score: hybrid[i],
                    rank: position + 1,
                },
                dense_score: dense[i],
                lexical_score: lexical_scores[i],
            })
            .collect();
        drop(state);

        stats.returned = results.len();
        stats.score_ms = elapsed_ms(scoring_started);
        stats.total_ms = elapsed_ms(started);
        debug!(
            candidates = stats.candidates,
            above_threshold = stats.above_threshold,
            returned = stats.returned,
            degraded = stats.degraded,
            total_ms = stats.total_ms,
            "Hybrid search finished"
        );
        Ok((results, stats))
    }

    /// Counts, dimension and a rough memory estimate.
    pub async fn statistics(&self) -> StoreStatistics {
        let state = self.state.read().await;
        let text_bytes: usize = state.entries.iter().map(|e| e.chunk.content.len()).sum();
        let matrix_bytes = state.matrix.as_ref().map_or(0, DenseMatrix::estimated_bytes);
        let lexical_bytes = state.lexical.as_ref().map_or(0, Bm25Index::estimated_bytes);
        StoreStatistics {
            total_documents: state.document_count(),
            total_chunks: state.entries.len(),
            dimension: state.dimension,
            estimated_memory: text_bytes + matrix_bytes + lexical_bytes,
        }
    }

    async fn ensure_available(&self) -> RagResult<()> {
        if self.embedder.is_available().await {
            Ok(())
        } else {
            Err(self.unavailable())
        }
    }

    fn unavailable(&self) -> RagError {
        RagError::BackendUnavailable(format!(
            "embedding model '{}' is not ready",
            self.embedder.model_name()
        ))
    }

    async fn embed_texts(&self, texts: &[&str]) -> RagResult<Vec<Vec<f32>>> {
        let batch_size = self.embedder.preferred_batch_size().max(1);
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size) {
            let embedded = self.embedder.embed_batch(batch).await?;
            if embedded.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "Backend returned {} vectors for {} texts",
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.extend(embedded);
        }
        debug!(texts = texts.len(), batch_size, "Embedded chunk texts");
        Ok(vectors)
    }
}

/// Check a batch against the current state. Returns the dimension the store
/// will have after the add.
fn validate_batch(state: &IndexState, chunks: &[Chunk], embeddings: &[Embedding]) -> RagResult<usize> {
    let expected = state
        .dimension
        .or_else(|| embeddings.first().map(Embedding::dimension))
        .unwrap_or(0);
    if !embeddings.is_empty() && expected == 0 {
        return Err(RagError::validation("Embeddings must not be empty"));
    }

    let mut seen = HashSet::with_capacity(chunks.len());
    for (chunk, embedding) in chunks.iter().zip(embeddings) {
        if embedding.chunk_id != chunk.id {
            return Err(RagError::validation(format!(
                "Embedding for chunk {} was given for chunk {}",
                embedding.chunk_id, chunk.id
            )));
        }
        if embedding.dimension() != expected {
            return Err(RagError::validation(format!(
                "Embedding dimension {} does not match store dimension {expected}",
                embedding.dimension()
            )));
        }
        if embedding.vector.iter().any(|v| !v.is_finite()) {
            return Err(RagError::validation(format!(
                "Embedding for chunk {} contains non-finite values",
                chunk.id
            )));
        }
        if !seen.insert(chunk.id) || state.contains(&chunk.id) {
            return Err(RagError::validation(format!(
                "Duplicate chunk id {}",
                chunk.id
            )));
        }
    }
    Ok(expected)
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
