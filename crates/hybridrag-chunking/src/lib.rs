//! Document chunking for the hybrid retrieval engine.
//!
//! A [`DocumentTypeDetector`] resolves a document's strategy tag from its
//! metadata, and a [`ChunkerRegistry`] turns that tag into a [`Chunker`].
//!
//! # Main types
//!
//! - [`Chunker`] — Trait implemented by every chunking strategy.
//! - [`GenericSplitter`] — Size-based splitter with overlap; the default strategy.
//! - [`StructuredSplitter`] — Header-aware splitter keeping Q&A pairs and timeline entries whole.
//! - [`MetadataPromoter`] — Emits summary and tag chunks from metadata ahead of the body.
//! - [`ChunkerRegistry`] — Open/closed tag -> constructor table.
//! - [`KeywordExtractor`] — Tags chunks with configured technical terms.

/// Strategy tag detection.
pub mod detector;
/// Size-based splitting.
pub mod generic;
/// Keyword tagging.
pub mod keywords;
/// Chunker construction options.
pub mod options;
/// Regex patterns for headers, Q&A pairs and timelines.
pub mod patterns;
/// Metadata promotion wrapper.
pub mod promoted;
/// Tag -> chunker registry.
pub mod registry;
/// The chunker trait and shared helpers.
pub mod strategy;
/// Structure-aware splitting.
pub mod structured;

pub use detector::{DocumentType, DocumentTypeDetector};
pub use generic::GenericSplitter;
pub use keywords::KeywordExtractor;
pub use options::{ChunkingOptions, StructureRules};
pub use promoted::MetadataPromoter;
pub use registry::{ChunkerFactory, ChunkerRegistry};
pub use strategy::{assemble, merge_metadata, ChunkDraft, Chunker};
pub use structured::StructuredSplitter;
