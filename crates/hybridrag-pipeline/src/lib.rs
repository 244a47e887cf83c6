//! Application layer of the hybrid retrieval engine.
//!
//! [`RetrievalService`] ties together document type detection, the chunker
//! registry and the [`hybridrag_memory::HybridVectorStore`].

/// The retrieval service.
pub mod service;

pub use service::RetrievalService;
