//! Dense + lexical hybrid storage for document chunks.
//!
//! Provides the embedding port, a local hashed embedding, the shared
//! tokenizer, a BM25 index over the chunk sequence and the
//! [`HybridVectorStore`] that keeps them consistent under a reader/writer
//! lock.
//!
//! # Main types
//!
//! - [`HybridVectorStore`] — Chunk store ranking by weighted dense + lexical scores.
//! - [`EmbeddingProvider`] — Port to the embedding backend.
//! - [`LocalEmbedding`] — Local hashed bag-of-words embedding provider.
//! - [`Bm25Index`] — Positional BM25 index rebuilt on every corpus change.
//! - [`Tokenizer`] / [`SimpleTokenizer`] — Shared index/query tokenization.

/// BM25 scoring.
pub mod bm25;
/// Embedding provider trait and local implementation.
pub mod embedding;
/// Row-major embedding matrix and cosine similarity.
pub mod matrix;
/// The hybrid vector store.
pub mod store;
/// Tokenization shared by indexing and queries.
pub mod tokenizer;

pub use bm25::{normalize_by_max, Bm25Index, Bm25Params};
pub use embedding::{EmbeddingProvider, LocalEmbedding, DEFAULT_BATCH_SIZE};
pub use matrix::{cosine_similarity, DenseMatrix};
pub use store::HybridVectorStore;
pub use tokenizer::{SimpleTokenizer, Tokenizer};
