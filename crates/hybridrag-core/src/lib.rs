//! Core types, configuration and errors for the hybrid retrieval engine.
//!
//! This crate is shared by the chunking, storage and pipeline crates.
//!
//! # Main types
//!
//! - [`RagError`] — Unified error enum for every subsystem.
//! - [`RagResult`] — Convenience alias for `Result<T, RagError>`.
//! - [`Document`] — A source document with free-form metadata.
//! - [`Chunk`] — An independently retrievable span of a document.
//! - [`Embedding`] — Dense vector computed for one chunk.
//! - [`SearchParams`] / [`SearchResult`] — Query knobs and ranked hits.
//! - [`RagConfig`] — TOML-backed engine configuration.

/// TOML-backed configuration.
pub mod config;
/// Documents, chunks and embeddings.
pub mod document;
/// Error type and result alias.
pub mod error;
/// Search parameters, results and reports.
pub mod search;

pub use config::{
    ChunkingConfig, DegradedMode, EmbeddingConfig, KeywordConfig, LexicalConfig, RagConfig,
    SearchConfig,
};
pub use document::{
    Chunk, ChunkMetadata, ChunkType, Document, Embedding, Metadata, DEFAULT_PRIORITY,
    HIGHEST_PRIORITY,
};
pub use error::{RagError, RagResult};
pub use search::{
    AddReport, ClearReport, ScoredResult, SearchParams, SearchResult, SearchStats,
    StoreStatistics,
};
