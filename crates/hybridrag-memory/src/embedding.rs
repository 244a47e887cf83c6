use crate::tokenizer::{SimpleTokenizer, Tokenizer};
use async_trait::async_trait;
use hybridrag_core::{EmbeddingConfig, RagError, RagResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Sub-batch size used when a provider does not state a preference.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Port to the embedding backend.
///
/// Callers check [`EmbeddingProvider::is_available`] before embedding; a
/// provider that is not ready should fail with
/// [`RagError::BackendUnavailable`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute the embedding vector of a single text.
    async fn embed_single(&self, text: &str) -> RagResult<Vec<f32>>;

    /// Compute embeddings for a batch of texts, in order.
    async fn embed_batch(&self, texts: &[&str]) -> RagResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed_single(text).await?);
        }
        Ok(results)
    }

    /// Dimension of the vectors this provider produces.
    fn dimension(&self) -> usize;

    /// Whether the backend can serve requests right now.
    async fn is_available(&self) -> bool {
        true
    }

    /// Model tag recorded on every [`hybridrag_core::Embedding`].
    fn model_name(&self) -> &str;

    /// How many texts to send per `embed_batch` call.
    fn preferred_batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }

    /// Prepare the backend (load models, open connections).
    async fn warm_up(&self) -> RagResult<()> {
        Ok(())
    }
}

/// Local hashed bag-of-words embedding (no external service needed).
///
/// Each token adds its term frequency at three FNV-1a hash positions; the
/// result is L2-normalized. Deterministic and always available.
pub struct LocalEmbedding {
    dimension: usize,
    batch_size: usize,
    model: String,
    tokenizer: Arc<dyn Tokenizer>,
}

impl LocalEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            batch_size: DEFAULT_BATCH_SIZE,
            model: "local-hash".to_string(),
            tokenizer: Arc::new(SimpleTokenizer::new()),
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            model: config.model.clone(),
            ..Self::new(config.dimension)
        }
    }

    /// Use the same tokenizer as the lexical index.
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed_single(&self, text: &str) -> RagResult<Vec<f32>> {
        if text.is_empty() {
            return Err(RagError::Embedding("Cannot embed empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];
        let words = self.tokenizer.tokenize(text);

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for word in &words {
            *freq.entry(word.as_str()).or_insert(0.0) += 1.0;
        }

        let total = words.len() as f32;
        if total == 0.0 {
            return Ok(vector);
        }

        for (word, count) in &freq {
            let tf = count / total;
            let bytes = word.as_bytes();
            let hash1 = fnv1a(bytes) as usize;
            let hash2 = fnv1a(&[bytes, &[1u8]].concat()) as usize;
            let hash3 = fnv1a(&[bytes, &[2u8]].concat()) as usize;

            vector[hash1 % self.dimension] += tf;
            vector[hash2 % self.dimension] += tf * 0.7;
            vector[hash3 % self.dimension] += tf * 0.5;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn preferred_batch_size(&self) -> usize {
        self.batch_size
    }
}

fn fnv1a(data: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::matrix::cosine_similarity;

    #[tokio::test]
    async fn test_local_embedding_dimension() {
        let emb = LocalEmbedding::new(128);
        assert_eq!(emb.dimension(), 128);
        let vec = emb.embed_single("hello world").await.unwrap();
        assert_eq!(vec.len(), 128);
    }

    #[tokio::test]
    async fn test_local_embedding_normalized() {
        let emb = LocalEmbedding::default();
        let vec = emb.embed_single("the quick brown fox jumps").await.unwrap();
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_similar_texts_score_higher() {
        let emb = LocalEmbedding::default();
        let v1 = emb.embed_single("rust programming language").await.unwrap();
        let v2 = emb.embed_single("rust programming systems").await.unwrap();
        let v3 = emb.embed_single("cooking recipes for dinner").await.unwrap();
        assert!(cosine_similarity(&v1, &v2) > cosine_similarity(&v1, &v3));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let emb = LocalEmbedding::default();
        assert!(matches!(emb.embed_single("").await, Err(RagError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_tokenless_text_is_zero_vector() {
        let emb = LocalEmbedding::new(16);
        let vec = emb.embed_single("  ! ").await.unwrap();
        assert!(vec.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = EmbeddingConfig {
            dimension: 64,
            batch_size: 8,
            model: "hash-64".to_string(),
        };
        let emb = LocalEmbedding::from_config(&config);
        assert_eq!(emb.dimension(), 64);
        assert_eq!(emb.preferred_batch_size(), 8);
        assert_eq!(emb.model_name(), "hash-64");
        assert!(emb.is_available().await);
        let vecs = emb.embed_batch(&["hello", "world"]).await.unwrap();
        assert_eq!(vecs.len(), 2);
        assert_eq!(vecs[0].len(), 64);
    }
}
