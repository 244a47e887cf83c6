use crate::config::SearchConfig;
use crate::document::Chunk;
use crate::error::{RagError, RagResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters of a single hybrid search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of results returned.
    pub top_k: usize,
    /// Minimum hybrid score a chunk needs to be returned.
    pub similarity_threshold: f32,
    /// Balance factor: 0.0 = pure lexical, 1.0 = pure dense.
    pub hybrid_weight: f32,
}

impl SearchParams {
    /// Creates search parameters.
    pub fn new(top_k: usize, similarity_threshold: f32, hybrid_weight: f32) -> Self {
        Self {
            top_k,
            similarity_threshold,
            hybrid_weight,
        }
    }

    /// Rejects a weight outside `[0, 1]` and non-finite thresholds.
    pub fn validate(&self) -> RagResult<()> {
        if !(0.0..=1.0).contains(&self.hybrid_weight) {
            return Err(RagError::validation(format!(
                "hybrid_weight must be within [0, 1], got {}",
                self.hybrid_weight
            )));
        }
        if !self.similarity_threshold.is_finite() {
            return Err(RagError::validation(
                "similarity_threshold must be a finite number",
            ));
        }
        Ok(())
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchParams {
    fn from(config: &SearchConfig) -> Self {
        Self {
            top_k: config.top_k,
            similarity_threshold: config.similarity_threshold,
            hybrid_weight: config.hybrid_weight,
        }
    }
}

/// One ranked hit of a hybrid search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Arc<Chunk>,
    /// Weighted hybrid score.
    pub score: f32,
    /// 1-based position in the result list.
    pub rank: usize,
}

/// A search hit together with the unweighted scores it was built from.
#[derive(Debug, Clone)]
pub struct ScoredResult {
    pub result: SearchResult,
    /// Cosine similarity between the query and chunk embeddings.
    pub dense_score: f32,
    /// Lexical score divided by the best lexical score of the batch.
    pub lexical_score: f32,
}

/// Timings and counters collected while answering one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub embed_ms: f64,
    pub score_ms: f64,
    pub total_ms: f64,
    /// Number of chunks that were scored.
    pub candidates: usize,
    /// Number of chunks at or above the similarity threshold.
    pub above_threshold: usize,
    pub returned: usize,
    /// True when dense scoring was skipped because the embedding backend was
    /// unavailable and lexical-only fallback is configured.
    pub degraded: bool,
}

/// Outcome of adding one document's chunks to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddReport {
    pub added_chunks: usize,
    pub total_chunks: usize,
    pub dimension: usize,
}

/// What the store held before a `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClearReport {
    pub previous_documents: usize,
    pub previous_chunks: usize,
}

/// Size summary of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub total_documents: usize,
    pub total_chunks: usize,
    /// Embedding dimension, established by the first add.
    pub dimension: Option<usize>,
    /// Rough size of chunk text, dense matrix and lexical index in bytes.
    pub estimated_memory: usize,
}
